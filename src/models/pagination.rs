//! Page resolution for list views

use serde::{Deserialize, Serialize};

/// `?page=` query parameter; kept as text so malformed values fall back instead of rejecting
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// Resolved position inside a result set of `total` rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub number: u32,
    pub per_page: u32,
    pub num_pages: u32,
    pub total: i64,
}

impl PageRequest {
    /// Missing or non-numeric pages resolve to 1, pages past the end to the last page.
    /// An empty result set still has one (empty) page.
    pub fn resolve(raw: Option<&str>, per_page: u32, total: i64) -> Self {
        let per_page = per_page.max(1);
        let total = total.max(0);
        let num_pages = ((total as u64).div_ceil(per_page as u64)).max(1) as u32;
        let number = raw
            .and_then(|p| p.trim().parse::<i64>().ok())
            .filter(|p| *p >= 1)
            .map(|p| p.min(num_pages as i64) as u32)
            .unwrap_or(1);
        Self {
            number,
            per_page,
            num_pages,
            total,
        }
    }

    pub fn offset(&self) -> i64 {
        (self.number as i64 - 1) * self.per_page as i64
    }

    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }

    pub fn into_page<T>(self, items: Vec<T>) -> Page<T> {
        Page {
            items,
            number: self.number,
            num_pages: self.num_pages,
            total: self.total,
            per_page: self.per_page,
            has_next: self.number < self.num_pages,
            has_previous: self.number > 1,
        }
    }
}

/// One page of a list
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u32,
    pub num_pages: u32,
    pub total: i64,
    pub per_page: u32,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            total: self.total,
            per_page: self.per_page,
            has_next: self.has_next,
            has_previous: self.has_previous,
        }
    }
}
