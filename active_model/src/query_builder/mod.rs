//! Query builder utilities
//!
//! Deferred read configuration and the SQL it lowers to.

pub mod builder;
pub mod filter;
pub mod ordering;
pub mod pagination;
pub mod sql_generation;
pub mod terms;

#[cfg(test)]
mod tests;

pub use builder::{Columns, Criteria, Search};
pub use filter::{LogicalOperator, QueryCondition, QueryFilter, QueryOperator};
pub use ordering::SortOrder;
pub use pagination::Pagination;
pub use sql_generation::{SqlGenerator, Statement};
pub use terms::Terms;
