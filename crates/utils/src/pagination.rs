use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

/// `page`/`limit` as they arrive on the query string.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, TS)]
pub struct PageRequest {
    #[ts(optional)]
    pub page: Option<u32>,
    #[ts(optional)]
    pub limit: Option<u32>,
}

impl PageRequest {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
        }
    }

    pub fn page(&self) -> u32 {
        self.page.unwrap_or(DEFAULT_PAGE).max(1)
    }

    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page() - 1) * i64::from(self.limit())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    pub fn new(request: &PageRequest, total: i64) -> Self {
        let page = request.page();
        let limit = request.limit();
        let total = total.max(0);
        let total_pages = (total + i64::from(limit) - 1) / i64::from(limit);

        Self {
            page,
            limit,
            total,
            total_pages,
            has_next: i64::from(page) < total_pages,
            has_prev: page > 1,
        }
    }
}

/// One page of a listing plus the metadata needed to fetch the next one.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: &PageRequest, total: i64) -> Self {
        Self {
            items,
            pagination: Pagination::new(request, total),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        let p = Pagination::new(&PageRequest::new(1, 10), 21);
        assert_eq!(p.total_pages, 3);
        assert!(p.has_next);
        assert!(!p.has_prev);
    }

    #[test]
    fn last_page_has_no_next() {
        let p = Pagination::new(&PageRequest::new(3, 10), 21);
        assert!(!p.has_next);
        assert!(p.has_prev);
    }

    #[test]
    fn empty_result_has_zero_pages() {
        let p = Pagination::new(&PageRequest::default(), 0);
        assert_eq!(p.total_pages, 0);
        assert!(!p.has_next);
        assert_eq!(p.page, DEFAULT_PAGE);
        assert_eq!(p.limit, DEFAULT_LIMIT);
    }

    #[test]
    fn limit_and_page_are_clamped() {
        let request = PageRequest::new(0, 500);
        assert_eq!(request.page(), 1);
        assert_eq!(request.limit(), MAX_LIMIT);
        assert_eq!(request.offset(), 0);

        let request = PageRequest::new(4, 0);
        assert_eq!(request.limit(), 1);
        assert_eq!(request.offset(), 3);
    }
}
