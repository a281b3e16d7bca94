//! LIMIT / OFFSET modifiers

/// Paging window; both bounds are bound as parameters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Pagination {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Window for a 1-based page number
    pub fn page(page: u32, per_page: u32) -> Self {
        let page = page.max(1) as i64;
        let per_page = per_page.max(1) as i64;
        Self {
            limit: Some(per_page),
            offset: Some((page - 1) * per_page),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.limit.is_none() && self.offset.is_none()
    }
}
