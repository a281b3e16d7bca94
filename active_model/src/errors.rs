use crate::validation::ValidationError;
use thiserror::Error;

/// Every failure a model can record or return.
///
/// Read and write paths share this type, so `Model::error()` always hands back
/// the same shape no matter which operation failed.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Database connection error: {0}")]
    Connection(#[source] sqlx::Error),

    #[error("Query error on '{table}' during {operation}: {source}")]
    Query {
        table: String,
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Unsupported type '{type_name}' for column '{column}'")]
    UnsupportedColumn { column: String, type_name: String },

    #[error("Missing value for placeholder ':{0}'")]
    MissingParameter(String),

    #[error("Invalid query parameters: {0}")]
    InvalidParams(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ModelError {
    pub fn query(table: &str, operation: &'static str, source: sqlx::Error) -> Self {
        Self::Query {
            table: table.to_string(),
            operation,
            source,
        }
    }

    /// SQLSTATE reported by the server, when the failure came from one
    pub fn code(&self) -> Option<String> {
        let source = match self {
            Self::Connection(source) | Self::Query { source, .. } => source,
            _ => return None,
        };

        match source {
            sqlx::Error::Database(db_err) => db_err.code().map(|code| code.into_owned()),
            _ => None,
        }
    }

    /// True when the server rejected the statement because of a constraint
    pub fn is_constraint_violation(&self) -> bool {
        // Class 23 covers integrity constraint violations
        self.code().is_some_and(|code| code.starts_with("23"))
    }
}

impl From<serde_urlencoded::de::Error> for ModelError {
    fn from(err: serde_urlencoded::de::Error) -> Self {
        Self::InvalidParams(err.to_string())
    }
}
