//! Parameter binding for attribute values

use serde_json::Value;
use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::Query;

/// Bind one attribute value.
///
/// Strings are always sent as text, whatever they look like. Columns of
/// other types receive them through an explicit cast in the SQL, either one
/// written by the caller or one added by the statement generator.
pub(crate) fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: Value,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        Value::String(s) => query.bind(s),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                if i >= i32::MIN as i64 && i <= i32::MAX as i64 {
                    query.bind(i as i32)
                } else {
                    query.bind(i)
                }
            } else if let Some(f) = n.as_f64() {
                query.bind(f)
            } else {
                query.bind(n.to_string())
            }
        }
        Value::Bool(b) => query.bind(b),
        Value::Null => query.bind(Option::<String>::None),
        other => query.bind(other.to_string()),
    }
}

pub(crate) fn bind_all<'q>(
    query: Query<'q, Postgres, PgArguments>,
    params: Vec<Value>,
) -> Query<'q, Postgres, PgArguments> {
    params.into_iter().fold(query, bind_value)
}
