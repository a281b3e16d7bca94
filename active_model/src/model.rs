//! Generic table model
//!
//! A `Model` is one row of one table while it lives in memory: an attribute
//! bag, an explicit persistence tag, a pending search and the outcome of the
//! last operation. Reads map rows into fresh models; `save` decides between
//! INSERT and UPDATE from the tag and reloads the stored row afterwards.
//!
//! Operations never return errors past this boundary. They answer `None` or
//! `false` and leave the failure in [`Model::error`]; a human readable text is
//! placed in [`Model::message`] when a write fails. The `fetch_*` methods are
//! the exception and return `Result` directly.

use crate::attributes::{Attributes, PRIMARY_KEY};
use crate::binding::bind_all;
use crate::connection::Database;
use crate::entity::Entity;
use crate::errors::ModelError;
use crate::message::Message;
use crate::query_builder::{
    Columns, Criteria, Pagination, QueryFilter, Search, SortOrder, SqlGenerator,
};
use crate::row_mapping::{decode_row, ColumnTypes};
use crate::validation::ValidatedTableName;
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{Postgres, Row, Transaction};

const INSERT_FAILED: &str = "System error while trying to register data";
const UPDATE_FAILED: &str = "System error while trying to update data";

/// Whether the row behind a model exists yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceState {
    New,
    Persisted(i64),
    /// A key is set but is not an integer; writes through it fail
    InvalidKey,
}

impl PersistenceState {
    fn from_attributes(attributes: &Attributes) -> Self {
        if !attributes.has_primary_key() {
            return PersistenceState::New;
        }
        attributes
            .primary_key()
            .map(PersistenceState::Persisted)
            .unwrap_or(PersistenceState::InvalidKey)
    }
}

#[derive(Debug)]
pub struct Model {
    db: Database,
    table: ValidatedTableName,
    attributes: Attributes,
    column_types: ColumnTypes,
    state: PersistenceState,
    pending: Option<Search>,
    last_error: Option<ModelError>,
    message: Option<Message>,
}

impl Model {
    pub fn new(db: &Database, table: &str) -> Result<Self, ModelError> {
        Ok(Self::with_attributes(
            db.clone(),
            ValidatedTableName::new(table)?,
            Attributes::new(),
            ColumnTypes::new(),
        ))
    }

    pub fn from_entity<E: Entity>(db: &Database, entity: &E) -> Result<Self, ModelError> {
        let mut model = Self::new(db, E::TABLE)?;
        model.replace_attributes(entity.to_attributes()?);
        Ok(model)
    }

    fn with_attributes(
        db: Database,
        table: ValidatedTableName,
        attributes: Attributes,
        column_types: ColumnTypes,
    ) -> Self {
        Self {
            db,
            table,
            state: PersistenceState::from_attributes(&attributes),
            attributes,
            column_types,
            pending: None,
            last_error: None,
            message: None,
        }
    }

    pub fn to_entity<E: Entity>(&self) -> Result<E, ModelError> {
        E::from_attributes(&self.attributes)
    }

    pub fn table(&self) -> &str {
        self.table.as_str()
    }

    pub fn state(&self) -> PersistenceState {
        self.state
    }

    pub fn id(&self) -> Option<i64> {
        match self.state {
            PersistenceState::Persisted(id) => Some(id),
            PersistenceState::New | PersistenceState::InvalidKey => None,
        }
    }

    /// Column types learned from the last row read into this model.
    ///
    /// Writes use them to cast text values into typed columns; a model that
    /// never read a row sends every string as plain text.
    pub fn column_types(&self) -> &ColumnTypes {
        &self.column_types
    }

    // ----------------------------------------
    // Attribute bag
    // ----------------------------------------

    /// Setting `id` re-tags the model: any non-blank key means UPDATE on save
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> &mut Self {
        self.attributes.set(name, value);
        if name == PRIMARY_KEY {
            self.state = PersistenceState::from_attributes(&self.attributes);
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Text value of a field, if it is a string
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).and_then(Value::as_str)
    }

    pub fn has(&self, name: &str) -> bool {
        self.attributes.has(name)
    }

    pub fn unset(&mut self, name: &str) -> Option<Value> {
        let removed = self.attributes.remove(name);
        if name == PRIMARY_KEY {
            self.state = PersistenceState::New;
        }
        removed
    }

    pub fn data(&self) -> &Attributes {
        &self.attributes
    }

    pub fn into_data(self) -> Attributes {
        self.attributes
    }

    fn replace_attributes(&mut self, attributes: Attributes) {
        self.state = PersistenceState::from_attributes(&attributes);
        self.attributes = attributes;
    }

    // ----------------------------------------
    // Error and message channel
    // ----------------------------------------

    pub fn error(&self) -> Option<&ModelError> {
        self.last_error.as_ref()
    }

    pub fn message(&self) -> Option<&Message> {
        self.message.as_ref()
    }

    fn record_error(&mut self, operation: &'static str, err: ModelError) {
        tracing::warn!(table = %self.table, operation, error = %err, "model operation failed");
        self.last_error = Some(err);
    }

    // ----------------------------------------
    // Pending search
    // ----------------------------------------

    /// Start a new pending read, replacing any previous one
    pub fn search(&mut self, criteria: impl Into<Criteria>) -> &mut Self {
        self.pending = Some(Search::new(criteria));
        self
    }

    /// New pending read restricted to a column list such as `"id, name"`
    pub fn search_with(&mut self, criteria: impl Into<Criteria>, columns: &str) -> &mut Self {
        self.pending = Some(Search::new(criteria).columns(Columns::parse(columns)));
        self
    }

    pub fn search_query(&mut self, search: Search) -> &mut Self {
        self.pending = Some(search);
        self
    }

    pub fn columns(&mut self, columns: &str) -> &mut Self {
        let search = self.pending.take().unwrap_or_default();
        self.pending = Some(search.columns(Columns::parse(columns)));
        self
    }

    pub fn order(&mut self, field: &str, order: SortOrder) -> &mut Self {
        let search = self.pending.take().unwrap_or_default();
        self.pending = Some(search.order_by(field, order));
        self
    }

    pub fn limit(&mut self, limit: i64) -> &mut Self {
        let search = self.pending.take().unwrap_or_default();
        self.pending = Some(search.limit(limit));
        self
    }

    pub fn offset(&mut self, offset: i64) -> &mut Self {
        let search = self.pending.take().unwrap_or_default();
        self.pending = Some(search.offset(offset));
        self
    }

    /// Page through the pending search, replacing any limit and offset
    pub fn paginate(&mut self, pagination: Pagination) -> &mut Self {
        let search = self.pending.take().unwrap_or_default();
        self.pending = Some(search.paginate(pagination));
        self
    }

    pub fn pending(&self) -> Option<&Search> {
        self.pending.as_ref()
    }

    // ----------------------------------------
    // Reads
    // ----------------------------------------

    /// First matching row; `None` when nothing matched or the read failed
    pub async fn result(&mut self) -> Option<Model> {
        self.last_error = None;
        match self.fetch_one().await {
            Ok(found) => found,
            Err(err) => {
                self.record_error("select", err);
                None
            }
        }
    }

    /// Every matching row.
    ///
    /// Zero rows gives `None`, not an empty vector; use [`Model::fetch_all`]
    /// when an empty list is wanted.
    pub async fn result_all(&mut self) -> Option<Vec<Model>> {
        self.last_error = None;
        match self.fetch_all().await {
            Ok(rows) if rows.is_empty() => None,
            Ok(rows) => Some(rows),
            Err(err) => {
                self.record_error("select", err);
                None
            }
        }
    }

    pub async fn fetch_one(&self) -> Result<Option<Model>, ModelError> {
        let stmt = SqlGenerator::select(&self.table, &self.pending_search())?;
        tracing::debug!(table = %self.table, sql = %stmt.sql, params = stmt.params.len(), "select one");

        let row = bind_all(sqlx::query(&stmt.sql), stmt.params)
            .fetch_optional(self.db.pool())
            .await
            .map_err(|e| ModelError::query(self.table.as_str(), "select", e))?;

        row.map(|row| self.hydrate(&row)).transpose()
    }

    pub async fn fetch_all(&self) -> Result<Vec<Model>, ModelError> {
        let stmt = SqlGenerator::select(&self.table, &self.pending_search())?;
        tracing::debug!(table = %self.table, sql = %stmt.sql, params = stmt.params.len(), "select all");

        let rows = bind_all(sqlx::query(&stmt.sql), stmt.params)
            .fetch_all(self.db.pool())
            .await
            .map_err(|e| ModelError::query(self.table.as_str(), "select", e))?;

        rows.iter().map(|row| self.hydrate(row)).collect()
    }

    pub async fn search_by_id(&mut self, id: i64) -> Option<Model> {
        self.search(QueryFilter::eq(PRIMARY_KEY, id)).result().await
    }

    pub async fn search_by_slug(&mut self, slug: &str) -> Option<Model> {
        self.search(QueryFilter::eq("slug", slug)).result().await
    }

    /// Rows matched by the pending criteria, ignoring order and paging
    pub async fn total(&mut self) -> i64 {
        self.last_error = None;
        match self.count().await {
            Ok(total) => total,
            Err(err) => {
                self.record_error("count", err);
                0
            }
        }
    }

    async fn count(&self) -> Result<i64, ModelError> {
        let search = self.pending_search();
        let stmt = SqlGenerator::count(&self.table, search.criteria())?;
        tracing::debug!(table = %self.table, sql = %stmt.sql, "count");

        let row = bind_all(sqlx::query(&stmt.sql), stmt.params)
            .fetch_one(self.db.pool())
            .await
            .map_err(|e| ModelError::query(self.table.as_str(), "count", e))?;

        row.try_get::<i64, _>("total")
            .map_err(|e| ModelError::query(self.table.as_str(), "count", e))
    }

    fn pending_search(&self) -> Search {
        self.pending.clone().unwrap_or_default()
    }

    fn hydrate(&self, row: &PgRow) -> Result<Model, ModelError> {
        let attributes = decode_row(self.table.as_str(), row)?;
        Ok(Self::with_attributes(
            self.db.clone(),
            self.table.clone(),
            attributes,
            ColumnTypes::from_row(row),
        ))
    }

    // ----------------------------------------
    // Writes
    // ----------------------------------------

    /// Insert or update, then reload the stored row into the bag.
    ///
    /// On failure the bag keeps what the caller set, the transaction is rolled
    /// back and `false` is returned.
    pub async fn save(&mut self) -> bool {
        self.last_error = None;
        self.message = None;

        let (outcome, failure_text) = match self.state {
            PersistenceState::New => (self.insert_and_reload().await, INSERT_FAILED),
            PersistenceState::Persisted(id) => (self.update_and_reload(id).await, UPDATE_FAILED),
            PersistenceState::InvalidKey => (Err(self.invalid_key()), UPDATE_FAILED),
        };

        match outcome {
            Ok(Some((stored, column_types))) => {
                self.replace_attributes(stored);
                self.column_types = column_types;
                true
            }
            Ok(None) => {
                tracing::debug!(table = %self.table, "saved row not found on reload, keeping attributes");
                true
            }
            Err(err) => {
                self.record_error("save", err);
                self.message = Some(Message::error(failure_text));
                false
            }
        }
    }

    fn invalid_key(&self) -> ModelError {
        let key = self
            .attributes
            .get(PRIMARY_KEY)
            .map(Value::to_string)
            .unwrap_or_default();
        ModelError::InvalidParams(format!(
            "'{}' is not a usable {} for '{}'",
            key, PRIMARY_KEY, self.table
        ))
    }

    async fn insert_and_reload(&self) -> Result<Option<(Attributes, ColumnTypes)>, ModelError> {
        let stmt =
            SqlGenerator::insert(&self.table, &self.attributes.sanitized(), &self.column_types)?;
        tracing::debug!(table = %self.table, sql = %stmt.sql, params = stmt.params.len(), "insert");

        let mut tx = self.db.begin().await?;
        let row = bind_all(sqlx::query(&stmt.sql), stmt.params)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| ModelError::query(self.table.as_str(), "insert", e))?;

        let id = decode_row(self.table.as_str(), &row)?
            .primary_key()
            .ok_or_else(|| ModelError::NotFound(format!("generated key of '{}'", self.table)))?;

        let stored = self.reload(&mut tx, id).await?;
        tx.commit()
            .await
            .map_err(|e| ModelError::query(self.table.as_str(), "commit", e))?;

        tracing::debug!(table = %self.table, id, "inserted");
        Ok(stored)
    }

    async fn update_and_reload(&self, id: i64) -> Result<Option<(Attributes, ColumnTypes)>, ModelError> {
        let mut tx = self.db.begin().await?;
        let attributes = self.attributes.sanitized();

        if let Some(stmt) = SqlGenerator::update(&self.table, &attributes, &self.column_types, id)? {
            tracing::debug!(table = %self.table, sql = %stmt.sql, params = stmt.params.len(), "update");
            let result = bind_all(sqlx::query(&stmt.sql), stmt.params)
                .execute(&mut *tx)
                .await
                .map_err(|e| ModelError::query(self.table.as_str(), "update", e))?;
            tracing::debug!(table = %self.table, id, rows = result.rows_affected(), "updated");
        }

        let stored = self.reload(&mut tx, id).await?;
        tx.commit()
            .await
            .map_err(|e| ModelError::query(self.table.as_str(), "commit", e))?;

        Ok(stored)
    }

    async fn reload(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        id: i64,
    ) -> Result<Option<(Attributes, ColumnTypes)>, ModelError> {
        let stmt = SqlGenerator::select(&self.table, &Search::new(QueryFilter::eq(PRIMARY_KEY, id)))?;

        let row = bind_all(sqlx::query(&stmt.sql), stmt.params)
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| ModelError::query(self.table.as_str(), "reload", e))?;

        row.map(|row| {
            let attributes = decode_row(self.table.as_str(), &row)?;
            Ok::<_, ModelError>((attributes, ColumnTypes::from_row(&row)))
        })
        .transpose()
    }

    /// Delete the row behind this model; `false` for a model never stored
    pub async fn destroy(&mut self) -> bool {
        match self.state {
            PersistenceState::New => false,
            PersistenceState::InvalidKey => {
                let err = self.invalid_key();
                self.record_error("delete", err);
                false
            }
            PersistenceState::Persisted(id) => self.delete(QueryFilter::eq(PRIMARY_KEY, id)).await,
        }
    }

    /// Delete every row matching the criteria.
    ///
    /// Succeeds even when nothing matched.
    pub async fn delete(&mut self, criteria: impl Into<Criteria>) -> bool {
        self.last_error = None;
        match self.execute_delete(&criteria.into()).await {
            Ok(rows) => {
                tracing::debug!(table = %self.table, rows, "deleted");
                true
            }
            Err(err) => {
                self.record_error("delete", err);
                false
            }
        }
    }

    async fn execute_delete(&self, criteria: &Criteria) -> Result<u64, ModelError> {
        let stmt = SqlGenerator::delete(&self.table, criteria)?;
        tracing::debug!(table = %self.table, sql = %stmt.sql, params = stmt.params.len(), "delete");

        let result = bind_all(sqlx::query(&stmt.sql), stmt.params)
            .execute(self.db.pool())
            .await
            .map_err(|e| ModelError::query(self.table.as_str(), "delete", e))?;

        Ok(result.rows_affected())
    }
}
