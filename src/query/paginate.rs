//! # Pagination
//!
//! Page windows over a filtered, sorted sequence and the page envelope
//! returned to callers.

use serde::Serialize;

/// 1-based page window `[(page-1)*page_size, page*page_size)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u32,
    pub page_size: u32,
}

impl PageWindow {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }
    }

    /// Records to skip before this page
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.page_size)
    }
}

/// `ceil(total / page_size)`; zero when either is zero
pub fn total_pages(total_count: u64, page_size: u32) -> u64 {
    if page_size == 0 {
        return 0;
    }
    total_count.div_ceil(u64::from(page_size))
}

/// One page of results plus count metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u64,
    pub has_previous: bool,
    pub has_next: bool,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, total_count: u64, window: PageWindow) -> Self {
        let total_pages = total_pages(total_count, window.page_size);
        let page = u64::from(window.page);
        Self {
            items,
            total_count,
            page: window.page,
            page_size: window.page_size,
            total_pages,
            has_previous: page > 1,
            has_next: page < total_pages,
        }
    }

    /// Transform the items, keeping the metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedResult<U> {
        PagedResult {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            page: self.page,
            page_size: self.page_size,
            total_pages: self.total_pages,
            has_previous: self.has_previous,
            has_next: self.has_next,
        }
    }
}
