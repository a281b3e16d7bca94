//! Pending read configuration
//!
//! A `Search` describes one read that has not run yet: which rows, which
//! columns, in what order and through which paging window.

use crate::query_builder::filter::QueryFilter;
use crate::query_builder::ordering::SortOrder;
use crate::query_builder::pagination::Pagination;
use crate::query_builder::terms::Terms;

/// Row selection of a read, update or delete
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Criteria {
    /// Every row of the table
    #[default]
    All,
    Filter(QueryFilter),
    Terms(Terms),
}

impl Criteria {
    pub fn is_all(&self) -> bool {
        matches!(self, Criteria::All)
    }
}

impl From<QueryFilter> for Criteria {
    fn from(filter: QueryFilter) -> Self {
        Criteria::Filter(filter)
    }
}

impl From<Terms> for Criteria {
    fn from(terms: Terms) -> Self {
        Criteria::Terms(terms)
    }
}

impl From<Option<QueryFilter>> for Criteria {
    fn from(filter: Option<QueryFilter>) -> Self {
        filter.map(Criteria::Filter).unwrap_or_default()
    }
}

/// Projection of a read
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Columns {
    #[default]
    All,
    List(Vec<String>),
}

impl Columns {
    /// Parse a comma separated column list; `*` or an empty string selects all
    pub fn parse(list: &str) -> Self {
        let list = list.trim();
        if list.is_empty() || list == "*" {
            return Columns::All;
        }

        Columns::List(
            list.split(',')
                .map(|column| column.trim().to_string())
                .filter(|column| !column.is_empty())
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Search {
    pub(crate) criteria: Criteria,
    pub(crate) columns: Columns,
    pub(crate) order_by: Vec<(String, SortOrder)>,
    pub(crate) pagination: Pagination,
}

impl Search {
    pub fn new(criteria: impl Into<Criteria>) -> Self {
        Self {
            criteria: criteria.into(),
            ..Self::default()
        }
    }

    pub fn columns(mut self, columns: Columns) -> Self {
        self.columns = columns;
        self
    }

    pub fn order_by(mut self, field: &str, order: SortOrder) -> Self {
        self.order_by.push((field.to_string(), order));
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.pagination.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.pagination.offset = Some(offset);
        self
    }

    pub fn paginate(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }

    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }
}
