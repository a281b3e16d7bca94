//! Row mapping
//!
//! Turns a PostgreSQL row of any shape into an `Attributes` bag by decoding
//! each column according to its server-reported type name.

use crate::attributes::Attributes;
use crate::errors::ModelError;
use indexmap::IndexMap;
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{Column, Row, TypeInfo};

/// Format used for TIMESTAMP columns without time zone
const NAIVE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn decode_row(table: &str, row: &PgRow) -> Result<Attributes, ModelError> {
    let mut attributes = Attributes::new();

    for column in row.columns() {
        let value = decode_column(row, column.ordinal(), column.type_info().name())
            .map_err(|err| match err {
                DecodeFailure::Unsupported => ModelError::UnsupportedColumn {
                    column: column.name().to_string(),
                    type_name: column.type_info().name().to_string(),
                },
                DecodeFailure::Sqlx(source) => ModelError::query(table, "decode", source),
            })?;
        attributes.set(column.name(), value);
    }

    Ok(attributes)
}

/// Server type name of every column seen in a decoded row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnTypes {
    types: IndexMap<String, String>,
}

impl ColumnTypes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_row(row: &PgRow) -> Self {
        row.columns()
            .iter()
            .map(|column| (column.name(), column.type_info().name()))
            .collect()
    }

    pub fn insert(&mut self, column: impl Into<String>, type_name: impl Into<String>) {
        self.types.insert(column.into(), type_name.into());
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.types.get(column).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Cast needed to store a text or null parameter into `column`.
    ///
    /// Text-like and unknown columns need none.
    pub fn cast_for(&self, column: &str) -> Option<&'static str> {
        let cast = match self.get(column)? {
            "INT2" => "int2",
            "INT4" => "int4",
            "INT8" => "int8",
            "FLOAT4" => "float4",
            "FLOAT8" => "float8",
            "BOOL" => "bool",
            "UUID" => "uuid",
            "DATE" => "date",
            "TIMESTAMP" => "timestamp",
            "TIMESTAMPTZ" => "timestamptz",
            "JSON" => "json",
            "JSONB" => "jsonb",
            _ => return None,
        };
        Some(cast)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ColumnTypes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            types: iter
                .into_iter()
                .map(|(column, type_name)| (column.into(), type_name.into()))
                .collect(),
        }
    }
}

enum DecodeFailure {
    Unsupported,
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for DecodeFailure {
    fn from(err: sqlx::Error) -> Self {
        Self::Sqlx(err)
    }
}

fn decode_column(row: &PgRow, index: usize, type_name: &str) -> Result<Value, DecodeFailure> {
    let value = match type_name {
        "INT2" => row.try_get::<Option<i16>, _>(index)?.map(Value::from),
        "INT4" => row.try_get::<Option<i32>, _>(index)?.map(Value::from),
        "INT8" => row.try_get::<Option<i64>, _>(index)?.map(Value::from),
        "FLOAT4" => row.try_get::<Option<f32>, _>(index)?.map(|f| Value::from(f as f64)),
        "FLOAT8" => row.try_get::<Option<f64>, _>(index)?.map(Value::from),
        "BOOL" => row.try_get::<Option<bool>, _>(index)?.map(Value::from),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CHAR" => {
            row.try_get::<Option<String>, _>(index)?.map(Value::from)
        }
        "UUID" => row
            .try_get::<Option<uuid::Uuid>, _>(index)?
            .map(|id| Value::from(id.to_string())),
        "DATE" => row
            .try_get::<Option<chrono::NaiveDate>, _>(index)?
            .map(|date| Value::from(date.to_string())),
        "TIMESTAMP" => row
            .try_get::<Option<chrono::NaiveDateTime>, _>(index)?
            .map(|ts| Value::from(ts.format(NAIVE_TIMESTAMP_FORMAT).to_string())),
        "TIMESTAMPTZ" => row
            .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(index)?
            .map(|ts| Value::from(ts.to_rfc3339())),
        "JSON" | "JSONB" => row.try_get::<Option<Value>, _>(index)?,
        _ => return Err(DecodeFailure::Unsupported),
    };

    Ok(value.unwrap_or(Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn casts_only_for_non_text_columns() {
        let types: ColumnTypes = [
            ("id", "INT8"),
            ("name", "VARCHAR"),
            ("code", "UUID"),
            ("created_at", "TIMESTAMPTZ"),
            ("payload", "JSONB"),
        ]
        .into_iter()
        .collect();

        assert_eq!(types.cast_for("id"), Some("int8"));
        assert_eq!(types.cast_for("name"), None);
        assert_eq!(types.cast_for("code"), Some("uuid"));
        assert_eq!(types.cast_for("created_at"), Some("timestamptz"));
        assert_eq!(types.cast_for("payload"), Some("jsonb"));
        assert_eq!(types.cast_for("unknown"), None);
    }
}
