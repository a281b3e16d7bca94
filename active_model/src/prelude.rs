//! Common imports for code working with models

pub use crate::attributes::{Attributes, PRIMARY_KEY};
pub use crate::connection::{ConnectionAccessor, Database};
pub use crate::entity::Entity;
pub use crate::errors::ModelError;
pub use crate::message::{Message, MessageKind};
pub use crate::model::{Model, PersistenceState};
pub use crate::query_builder::{Criteria, Pagination, QueryFilter, Search, SortOrder, Terms};

pub use config::DatabaseConfig;
