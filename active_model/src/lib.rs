//! # active-model
//!
//! Active-record style access to one PostgreSQL table at a time.
//!
//! A [`Model`] holds a row as an ordered attribute bag, composes a pending
//! search, and saves itself with INSERT or UPDATE depending on whether it
//! already has a key. Failures stay on the model as a [`ModelError`] and,
//! for writes, a user facing [`Message`].
//!
//! ```rust,no_run
//! use active_model::prelude::*;
//!
//! # async fn demo(db: Database) -> Result<(), ModelError> {
//! let mut broker = Model::new(&db, "corretores")?;
//! broker.set("cpf", "52998224725").set("creci", "12345").set("name", "Ana");
//! if broker.save().await {
//!     println!("stored as {:?}", broker.id());
//! }
//!
//! let mut finder = Model::new(&db, "corretores")?;
//! let found = finder
//!     .search(Terms::with_params("creci = :c", "c=12345")?)
//!     .order("name", SortOrder::Asc)
//!     .result_all()
//!     .await;
//! # let _ = found;
//! # Ok(())
//! # }
//! ```

pub mod attributes;
mod binding;
pub mod connection;
pub mod entity;
pub mod errors;
pub mod message;
pub mod model;
pub mod prelude;
pub mod query_builder;
pub mod row_mapping;
pub mod validation;

pub use attributes::{Attributes, PRIMARY_KEY};
pub use connection::{ConnectionAccessor, Database};
pub use entity::Entity;
pub use errors::ModelError;
pub use message::{Message, MessageKind, escape_html};
pub use model::{Model, PersistenceState};
pub use row_mapping::ColumnTypes;
pub use query_builder::{
    Columns, Criteria, LogicalOperator, Pagination, QueryCondition, QueryFilter, QueryOperator,
    Search, SortOrder, SqlGenerator, Statement, Terms,
};
pub use validation::{ValidatedFieldName, ValidatedTableName, ValidationError};

pub use sqlx;

pub type DbPool = sqlx::PgPool;
