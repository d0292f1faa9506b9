use serde::{Deserialize, Serialize};

use crate::{config::PageLimits, ApiError, ApiResult};

/// `page` and `limit` as received in a query string.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page:  Option<usize>,
    pub limit: Option<usize>,
}

impl PageParams {
    /// Validates the parameters against the configured limits.
    pub fn resolve(self, limits: PageLimits) -> ApiResult<PageRequest> {
        let page = self.page.unwrap_or(1);
        if page == 0 {
            return Err(ApiError::validation("page must be at least 1"));
        }
        let limit = self.limit.unwrap_or(limits.default_limit);
        if limit == 0 || limit > limits.max_limit {
            return Err(ApiError::validation(format!(
                "limit must be between 1 and {}",
                limits.max_limit
            )));
        }
        Ok(PageRequest { page, limit })
    }
}

/// A validated page selection, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page:  usize,
    pub limit: usize,
}

impl PageRequest {
    pub const fn offset(self) -> usize { self.page.saturating_sub(1).saturating_mul(self.limit) }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page:  usize,
    pub limit: usize,
    pub total: usize,
    pub pages: usize,
}

impl<T> Page<T> {
    /// A zero `limit` yields zero pages.
    pub const fn new(items: Vec<T>, request: PageRequest, total: usize) -> Self {
        let pages = if request.limit == 0 { 0 } else { total.div_ceil(request.limit) };
        Self {
            items,
            page: request.page,
            limit: request.limit,
            total,
            pages,
        }
    }

    /// Converts the items, keeping the paging data.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page:  self.page,
            limit: self.limit,
            total: self.total,
            pages: self.pages,
        }
    }
}
