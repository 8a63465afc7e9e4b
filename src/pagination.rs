//! Offset pagination for Podio list endpoints.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default page size for list operations.
pub const DEFAULT_LIMIT: u32 = 20;

/// Maximum pages to fetch (safety limit).
const MAX_PAGES: u32 = 1000;

/// A page of results from the Podio API.
#[derive(Debug, Clone, Serialize)]
#[serde(bound = "T: Serialize")]
pub struct Page<T> {
    /// The items on this page.
    pub items: Vec<T>,
    /// Total number of matching items (if the endpoint reports it).
    pub total: Option<u64>,
    /// Offset of the first item on this page.
    pub offset: u32,
    /// Requested page size.
    pub limit: u32,
    /// Whether there are more pages.
    pub has_more: bool,
}

impl<T> Page<T> {
    /// Create a new page from items and pagination info.
    #[must_use]
    pub fn new(items: Vec<T>, params: PaginationParams, total: Option<u64>) -> Self {
        let has_more = match total {
            Some(t) => u64::from(params.offset) + (items.len() as u64) < t,
            None => items.len() >= params.limit as usize,
        };
        Self {
            items,
            total,
            offset: params.offset,
            limit: params.limit,
            has_more,
        }
    }

    /// Map the items to a different type.
    #[must_use]
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            offset: self.offset,
            limit: self.limit,
            has_more: self.has_more,
        }
    }

    /// Returns true if this page has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the number of items on this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns an iterator over the items in this page.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T> IntoIterator for Page<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Page<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// `limit`/`offset` query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationParams {
    /// Number of items per page.
    pub limit: u32,
    /// Number of items to skip.
    pub offset: u32,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl PaginationParams {
    /// Pagination params for an explicit window.
    #[must_use]
    pub fn new(limit: u32, offset: u32) -> Self {
        Self { limit, offset }
    }

    /// The window directly after this one.
    #[must_use]
    pub fn next(self) -> Self {
        Self {
            limit: self.limit,
            offset: self.offset.saturating_add(self.limit),
        }
    }
}

/// Fetch pages starting at `start` until one reports no more items.
pub(crate) async fn collect_all<T, F, Fut>(start: PaginationParams, mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(PaginationParams) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    let mut all_items = Vec::new();
    let mut params = start;
    let mut pages = 0;

    loop {
        let page = fetch(params).await?;
        // A zero-sized window never advances the offset.
        let has_more = page.has_more && !page.is_empty() && params.limit > 0;
        all_items.extend(page.items);

        if !has_more {
            break;
        }
        params = params.next();
        pages += 1;

        if pages >= MAX_PAGES {
            tracing::warn!("Reached pagination limit of {} pages, stopping", MAX_PAGES);
            break;
        }
    }

    Ok(all_items)
}
