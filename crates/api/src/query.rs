//! Query parameter types shared by list endpoints.

use serde::Deserialize;
use sitedesk_core::search::{self, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};

/// `?limit=&offset=` pagination.
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PaginationParams {
    /// Clamped `(limit, offset)` for list queries.
    pub fn resolve(&self) -> (i64, i64) {
        (
            search::clamp_limit(self.limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT),
            search::clamp_offset(self.offset),
        )
    }
}
