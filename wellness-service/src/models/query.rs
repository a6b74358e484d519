//! Listing parameters for session history.

use super::SessionKind;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;
/// MongoDB stores `skip` as a signed 64-bit integer.
const MAX_SKIP: u64 = i64::MAX as u64;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    CreatedAt,
    Score,
    DurationSeconds,
}

impl SortField {
    /// Stored field name.
    pub fn field_name(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::Score => "score",
            SortField::DurationSeconds => "duration_seconds",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn direction(&self) -> i32 {
        match self {
            SortOrder::Asc => 1,
            SortOrder::Desc => -1,
        }
    }
}

/// Normalised listing query; `page` is 1-based.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionQuery {
    pub kind: Option<SessionKind>,
    pub sort_by: SortField,
    pub order: SortOrder,
    pub page: u64,
    pub limit: u64,
}

impl SessionQuery {
    /// Clamp raw paging input: page defaults to 1, limit to 10 and is capped at 100.
    pub fn new(
        page: Option<u64>,
        limit: Option<u64>,
        sort_by: Option<SortField>,
        order: Option<SortOrder>,
        kind: Option<SessionKind>,
    ) -> Self {
        Self {
            kind,
            sort_by: sort_by.unwrap_or_default(),
            order: order.unwrap_or_default(),
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Rows before the requested page. `None` when the page is beyond any
    /// offset the store can address.
    pub fn skip(&self) -> Option<u64> {
        (self.page - 1)
            .checked_mul(self.limit)
            .filter(|skip| *skip <= MAX_SKIP)
    }

    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.limit)
    }
}

impl Default for SessionQuery {
    fn default() -> Self {
        Self::new(None, None, None, None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paging_defaults() {
        let q = SessionQuery::default();
        assert_eq!(q.page, 1);
        assert_eq!(q.limit, DEFAULT_PAGE_SIZE);
        assert_eq!(q.sort_by, SortField::CreatedAt);
        assert_eq!(q.order, SortOrder::Desc);
        assert_eq!(q.skip(), Some(0));
    }

    #[test]
    fn paging_is_clamped() {
        let q = SessionQuery::new(Some(0), Some(500), None, None, None);
        assert_eq!(q.page, 1);
        assert_eq!(q.limit, MAX_PAGE_SIZE);

        let q = SessionQuery::new(Some(3), Some(0), None, None, None);
        assert_eq!(q.limit, 1);
        assert_eq!(q.skip(), Some(2));
    }

    #[test]
    fn unaddressable_page_has_no_offset() {
        let q = SessionQuery::new(Some(u64::MAX), Some(MAX_PAGE_SIZE), None, None, None);
        assert_eq!(q.skip(), None);

        let q = SessionQuery::new(Some(u64::MAX), Some(1), None, None, None);
        assert_eq!(q.skip(), None);

        let q = SessionQuery::new(Some(1_000_001), Some(10), None, None, None);
        assert_eq!(q.skip(), Some(10_000_000));
    }

    #[test]
    fn total_pages_rounds_up() {
        let q = SessionQuery::new(Some(1), Some(10), None, None, None);
        assert_eq!(q.total_pages(0), 0);
        assert_eq!(q.total_pages(10), 1);
        assert_eq!(q.total_pages(11), 2);
    }
}
