//! Client-held query state for the todo listing.
//!
//! `FilterCriteria` is what gets serialized into the `GET /api/todos` query
//! string. `FilterUpdate` is the partial form used by `set_filters`; merging
//! one into the other enforces the page invariants.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::types::Priority;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
/// Largest page the API accepts.
pub const MAX_PAGE_SIZE: u32 = 50;

/// Unreserved characters (RFC 3986) pass through unescaped.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCriteria {
    pub search: String,
    pub completed: Option<bool>,
    pub category_id: Option<i64>,
    pub priority: Option<Priority>,
    /// 1-based.
    pub page: u32,
    pub limit: u32,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }
}

impl FilterCriteria {
    pub fn with_page_size(limit: u32) -> Self {
        Self {
            search: String::new(),
            completed: None,
            category_id: None,
            priority: None,
            page: 1,
            limit: clamp_limit(limit),
        }
    }

    /// Apply `update` and return the new criteria.
    ///
    /// Touching any of search/completed/category/priority sends the listing
    /// back to page 1, even when the same update also names a page. A page or
    /// limit change on its own keeps the requested page.
    pub fn merge(&self, update: &FilterUpdate) -> FilterCriteria {
        let mut next = self.clone();
        if let Some(search) = &update.search {
            next.search = search.clone();
        }
        if let Some(completed) = update.completed {
            next.completed = completed;
        }
        if let Some(category_id) = update.category_id {
            next.category_id = category_id;
        }
        if let Some(priority) = update.priority {
            next.priority = priority;
        }
        if let Some(limit) = update.limit {
            next.limit = clamp_limit(limit);
        }
        if update.narrows() {
            next.page = 1;
        } else if let Some(page) = update.page {
            next.page = page.max(1);
        }
        next
    }

    /// Query parameters in wire order. Empty search and unset filters are
    /// omitted; page and limit are always sent.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(6);
        if !self.search.is_empty() {
            pairs.push(("search", self.search.clone()));
        }
        if let Some(completed) = self.completed {
            pairs.push(("completed", completed.to_string()));
        }
        if let Some(category_id) = self.category_id {
            pairs.push(("category_id", category_id.to_string()));
        }
        if let Some(priority) = self.priority {
            pairs.push(("priority", priority.as_str().to_string()));
        }
        pairs.push(("page", self.page.to_string()));
        pairs.push(("limit", self.limit.to_string()));
        pairs
    }

    /// Percent-encoded query string without the leading `?`.
    pub fn to_query_string(&self) -> String {
        self.query_pairs()
            .into_iter()
            .map(|(key, value)| format!("{key}={}", utf8_percent_encode(&value, QUERY_VALUE)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// A partial change to `FilterCriteria`.
///
/// Nullable criteria take `Option<Option<_>>`: `None` leaves the current
/// value, `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterUpdate {
    pub search: Option<String>,
    pub completed: Option<Option<bool>>,
    pub category_id: Option<Option<i64>>,
    pub priority: Option<Option<Priority>>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl FilterUpdate {
    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn completed(mut self, completed: Option<bool>) -> Self {
        self.completed = Some(completed);
        self
    }

    pub fn category(mut self, category_id: Option<i64>) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn priority(mut self, priority: Option<Priority>) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// True when the update touches a field other than page/limit.
    fn narrows(&self) -> bool {
        self.search.is_some()
            || self.completed.is_some()
            || self.category_id.is_some()
            || self.priority.is_some()
    }
}

fn clamp_limit(limit: u32) -> u32 {
    limit.clamp(1, MAX_PAGE_SIZE)
}
