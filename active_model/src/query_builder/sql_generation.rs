//! SQL composition
//!
//! Every statement is built from validated identifiers and `$n` placeholders.
//! Clauses always appear in the order WHERE, ORDER BY, LIMIT, OFFSET.

use crate::attributes::{Attributes, PRIMARY_KEY};
use crate::errors::ModelError;
use crate::query_builder::builder::{Columns, Criteria, Search};
use crate::query_builder::filter::{LogicalOperator, QueryCondition, QueryFilter, QueryOperator};
use crate::query_builder::ordering::SortOrder;
use crate::query_builder::pagination::Pagination;
use crate::row_mapping::ColumnTypes;
use crate::validation::{ValidatedFieldName, ValidatedTableName};
use serde_json::Value;

/// SQL text plus the values bound to its placeholders, in order
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

pub struct SqlGenerator;

impl SqlGenerator {
    pub fn select(table: &ValidatedTableName, search: &Search) -> Result<Statement, ModelError> {
        let mut params = Vec::new();
        let mut sql = format!(
            "SELECT {} FROM {}",
            Self::build_columns(&search.columns)?,
            table
        );

        sql.push_str(&Self::build_where_clause(&search.criteria, &mut params)?);
        sql.push_str(&Self::build_order_clause(&search.order_by)?);
        sql.push_str(&Self::build_limit_clause(search.pagination, &mut params));

        Ok(Statement { sql, params })
    }

    /// Row count for the criteria; ordering and paging do not apply
    pub fn count(table: &ValidatedTableName, criteria: &Criteria) -> Result<Statement, ModelError> {
        let mut params = Vec::new();
        let mut sql = format!("SELECT COUNT(*) AS total FROM {}", table);
        sql.push_str(&Self::build_where_clause(criteria, &mut params)?);
        Ok(Statement { sql, params })
    }

    /// DELETE requires a criteria; wiping a table is not expressible here
    pub fn delete(table: &ValidatedTableName, criteria: &Criteria) -> Result<Statement, ModelError> {
        if criteria.is_all() {
            return Err(ModelError::InvalidParams(format!(
                "refusing to delete from '{}' without criteria",
                table
            )));
        }

        let mut params = Vec::new();
        let mut sql = format!("DELETE FROM {}", table);
        sql.push_str(&Self::build_where_clause(criteria, &mut params)?);
        Ok(Statement { sql, params })
    }

    /// INSERT of every writable attribute, returning the generated key.
    ///
    /// Text and null values headed for a column of a known non-text type get
    /// an explicit cast; see [`ColumnTypes::cast_for`].
    pub fn insert(
        table: &ValidatedTableName,
        attributes: &Attributes,
        types: &ColumnTypes,
    ) -> Result<Statement, ModelError> {
        let mut columns = Vec::new();
        let mut placeholders = Vec::new();
        let mut params = Vec::new();

        for (name, value) in attributes.writable() {
            columns.push(ValidatedFieldName::new(name)?.to_string());
            params.push(value.clone());
            placeholders.push(Self::placeholder(params.len(), name, value, types));
        }

        let sql = if columns.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES RETURNING {}", table, PRIMARY_KEY)
        } else {
            format!(
                "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
                table,
                columns.join(", "),
                placeholders.join(", "),
                PRIMARY_KEY
            )
        };

        Ok(Statement { sql, params })
    }

    /// UPDATE of every writable attribute on one row.
    ///
    /// Returns `None` when the bag holds nothing but the key.
    pub fn update(
        table: &ValidatedTableName,
        attributes: &Attributes,
        types: &ColumnTypes,
        id: i64,
    ) -> Result<Option<Statement>, ModelError> {
        let mut assignments = Vec::new();
        let mut params = Vec::new();

        for (name, value) in attributes.writable() {
            let field = ValidatedFieldName::new(name)?;
            params.push(value.clone());
            assignments.push(format!(
                "{} = {}",
                field,
                Self::placeholder(params.len(), name, value, types)
            ));
        }

        if assignments.is_empty() {
            return Ok(None);
        }

        params.push(Value::from(id));
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ${}",
            table,
            assignments.join(", "),
            PRIMARY_KEY,
            params.len()
        );

        Ok(Some(Statement { sql, params }))
    }

    fn placeholder(index: usize, column: &str, value: &Value, types: &ColumnTypes) -> String {
        let cast = match value {
            Value::String(_) | Value::Null => types.cast_for(column),
            _ => None,
        };
        match cast {
            Some(cast) => format!("${}::{}", index, cast),
            None => format!("${}", index),
        }
    }

    fn build_columns(columns: &Columns) -> Result<String, ModelError> {
        match columns {
            Columns::All => Ok("*".to_string()),
            Columns::List(list) if list.is_empty() => Ok("*".to_string()),
            Columns::List(list) => {
                let validated = list
                    .iter()
                    .map(|column| ValidatedFieldName::new(column).map(|f| f.to_string()))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(validated.join(", "))
            }
        }
    }

    fn build_where_clause(criteria: &Criteria, params: &mut Vec<Value>) -> Result<String, ModelError> {
        let condition = match criteria {
            Criteria::All => return Ok(String::new()),
            Criteria::Filter(filter) => Self::build_filter_sql(filter, params)?,
            Criteria::Terms(terms) => terms.lower(params)?,
        };

        if condition.trim().is_empty() {
            Ok(String::new())
        } else {
            Ok(format!(" WHERE {}", condition))
        }
    }

    fn build_order_clause(order_by: &[(String, SortOrder)]) -> Result<String, ModelError> {
        if order_by.is_empty() {
            return Ok(String::new());
        }

        let parts = order_by
            .iter()
            .map(|(field, order)| {
                ValidatedFieldName::new(field).map(|field| format!("{} {}", field, order.to_sql()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(format!(" ORDER BY {}", parts.join(", ")))
    }

    fn build_limit_clause(pagination: Pagination, params: &mut Vec<Value>) -> String {
        let mut clause = String::new();

        if let Some(limit) = pagination.limit {
            params.push(Value::from(limit));
            clause.push_str(&format!(" LIMIT ${}", params.len()));
        }

        if let Some(offset) = pagination.offset {
            params.push(Value::from(offset));
            clause.push_str(&format!(" OFFSET ${}", params.len()));
        }

        clause
    }

    fn build_filter_sql(filter: &QueryFilter, params: &mut Vec<Value>) -> Result<String, ModelError> {
        match filter {
            QueryFilter::Condition(condition) => Self::build_condition_sql(condition, params),
            QueryFilter::Group { operator, filters } => {
                let operator_str = match operator {
                    LogicalOperator::And => " AND ",
                    LogicalOperator::Or => " OR ",
                };

                let conditions = filters
                    .iter()
                    .map(|f| Self::build_filter_sql(f, params))
                    .collect::<Result<Vec<_>, _>>()?
                    .into_iter()
                    .filter(|sql| !sql.is_empty())
                    .collect::<Vec<_>>();

                Ok(match conditions.len() {
                    0 => String::new(),
                    1 => conditions[0].clone(),
                    _ => format!("({})", conditions.join(operator_str)),
                })
            }
        }
    }

    fn build_condition_sql(condition: &QueryCondition, params: &mut Vec<Value>) -> Result<String, ModelError> {
        let field = ValidatedFieldName::new(&condition.field)?;
        let operator = &condition.operator;

        let sql = match (operator, &condition.value) {
            (QueryOperator::IsNull | QueryOperator::IsNotNull, _) => {
                format!("{} {}", field, operator.to_sql())
            }
            (QueryOperator::Eq, None | Some(Value::Null)) => format!("{} IS NULL", field),
            (QueryOperator::Ne, None | Some(Value::Null)) => format!("{} IS NOT NULL", field),
            (QueryOperator::In | QueryOperator::NotIn, Some(Value::Array(values))) => {
                if values.is_empty() {
                    // IN () is invalid SQL
                    return Ok(match operator {
                        QueryOperator::In => "FALSE".to_string(),
                        _ => "TRUE".to_string(),
                    });
                }
                let placeholders = values
                    .iter()
                    .map(|value| {
                        params.push(value.clone());
                        format!("${}", params.len())
                    })
                    .collect::<Vec<_>>();
                format!("{} {} ({})", field, operator.to_sql(), placeholders.join(", "))
            }
            (QueryOperator::In | QueryOperator::NotIn, Some(_)) => {
                return Err(ModelError::InvalidParams(format!(
                    "operator {} on '{}' needs a list of values",
                    operator.to_sql(),
                    field
                )))
            }
            (_, Some(value)) => {
                params.push(value.clone());
                format!("{} {} ${}", field, operator.to_sql(), params.len())
            }
            (_, None) => {
                return Err(ModelError::InvalidParams(format!(
                    "operator {} on '{}' needs a value",
                    operator.to_sql(),
                    field
                )))
            }
        };

        Ok(sql)
    }
}
