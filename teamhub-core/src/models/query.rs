//! List filtering and pagination.
//!
//! Every listing endpoint shares one filter shape; endpoints ignore the
//! parameters that do not apply to them. `total` always counts the full
//! filtered (and visibility-scoped) set, not the returned page.

use serde::Serialize;

/// Default page size when the client does not send `page_size`
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Common list query parameters
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    /// Sort key; `created_at` ascending by default, `-created_at` descending
    pub order_by: Option<String>,

    /// 1-based page number
    pub page: Option<usize>,

    /// Entries per page
    pub page_size: Option<usize>,

    /// Case-insensitive substring match on textual content
    pub keyword: Option<String>,

    /// Case-insensitive substring match on the entity name
    pub name: Option<String>,

    /// Restrict to entities related to any of these teams (repeatable)
    pub team_ids: Vec<i64>,

    /// Restrict users to holders of any of these roles (repeatable)
    pub role_names: Vec<String>,

    /// For team listings: only teams the actor leads (or does not lead)
    pub leading: Option<bool>,

    /// For team-project listings: only projects the actor participates in
    /// (or does not participate in)
    pub part_in: Option<bool>,

    /// Inclusive lower creation-time bound, unix seconds
    pub start_at: Option<i64>,

    /// Inclusive upper creation-time bound, unix seconds
    pub end_at: Option<i64>,
}

impl ListFilter {
    /// True when `candidate` passes the `name` filter
    pub fn matches_name(&self, candidate: &str) -> bool {
        match &self.name {
            None => true,
            Some(wanted) => candidate
                .to_lowercase()
                .contains(&wanted.to_lowercase()),
        }
    }

    /// True when `content` passes the `keyword` filter
    pub fn matches_keyword(&self, content: &str) -> bool {
        match &self.keyword {
            None => true,
            Some(wanted) => content
                .to_lowercase()
                .contains(&wanted.to_lowercase()),
        }
    }

    /// True when a creation timestamp (unix seconds) falls inside the
    /// inclusive `start_at`/`end_at` window
    pub fn matches_time(&self, unix: i64) -> bool {
        if let Some(start) = self.start_at {
            if unix < start {
                return false;
            }
        }
        if let Some(end) = self.end_at {
            if unix > end {
                return false;
            }
        }
        true
    }

    /// Cuts the filtered set down to the requested page
    ///
    /// `total` reflects the size before pagination. Page numbers are
    /// 1-based; out-of-range pages yield an empty list with the same total.
    pub fn paginate<T>(&self, items: Vec<T>) -> ListPage<T> {
        let total = items.len();
        let page = self.page.unwrap_or(1).max(1);
        let page_size = self.page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1);
        let list = items
            .into_iter()
            .skip((page - 1) * page_size)
            .take(page_size)
            .collect();
        ListPage { total, list }
    }
}

/// Paginated list response: `{"total": N, "list": [...]}`
#[derive(Debug, Clone, Serialize)]
pub struct ListPage<T> {
    pub total: usize,
    pub list: Vec<T>,
}
