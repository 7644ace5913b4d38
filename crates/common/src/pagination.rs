//! Page/limit pagination shared by every list endpoint.

use serde::Serialize;

/// Default number of items per page.
pub const DEFAULT_LIMIT: u32 = 10;

/// Largest page size a client may request.
pub const MAX_LIMIT: u32 = 100;

/// A validated page request: `page >= 1`, `1 <= limit <= 100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    /// Creates a page request, clamping both values into range.
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, MAX_LIMIT),
        }
    }

    /// Builds a page request from raw query-string values.
    ///
    /// Missing or non-numeric values fall back to the defaults. A `limit` of
    /// zero also falls back to the default rather than clamping to one.
    pub fn from_params(page: Option<&str>, limit: Option<&str>) -> Self {
        let page = parse_param(page).unwrap_or(1).max(1);
        let limit = match parse_param(limit) {
            None | Some(0) => i64::from(DEFAULT_LIMIT),
            Some(n) => n.clamp(1, i64::from(MAX_LIMIT)),
        };

        Self {
            page: u32::try_from(page).unwrap_or(u32::MAX),
            // Clamped to [1, 100] above.
            limit: u32::try_from(limit).unwrap_or(DEFAULT_LIMIT),
        }
    }

    /// Returns the 1-based page number.
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Returns the page size.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Returns the number of items to skip.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, DEFAULT_LIMIT)
    }
}

fn parse_param(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
}

/// One page of results plus the counts a client needs to render a pager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u64,
}

impl<T> Page<T> {
    /// Wraps a slice of results fetched for `request` out of `total` matches.
    pub fn new(data: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            data,
            page: request.page(),
            limit: request.limit(),
            total,
            pages: page_count(total, request.limit()),
        }
    }

    /// Converts every item, keeping the paging counters.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            page: self.page,
            limit: self.limit,
            total: self.total,
            pages: self.pages,
        }
    }
}

/// `ceil(total / limit)`, never less than one.
pub fn page_count(total: u64, limit: u32) -> u64 {
    let limit = u64::from(limit.max(1));
    total.div_ceil(limit).max(1)
}
