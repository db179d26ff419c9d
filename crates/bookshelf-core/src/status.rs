//! Request status and the observable state snapshot.
//!
//! The store publishes a [`CatalogSnapshot`] on a `tokio::sync::watch`
//! channel whenever its metadata or request status changes. UI layers hold a
//! receiver and re-render on `changed()`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Fetch status of a single page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PageStatus {
    /// A request for the page is in flight.
    Loading,
    /// The page is cached.
    Ready {
        /// When the response was stored.
        fetched_at: DateTime<Utc>,
    },
    /// The most recent request for the page failed.
    Failed {
        /// Human-readable message, same text as the store-wide error.
        message: String,
    },
}

impl PageStatus {
    /// Whether a request is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

/// Point-in-time view of the store, minus the cached records themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogSnapshot {
    /// `meta.total_pages` of the most recent successful fetch.
    pub total_pages: u32,
    /// `meta.total` of the most recent successful fetch plus the configured offset.
    pub total_books: u64,
    /// `meta.current_page` of the most recent successful fetch.
    pub current_page: u32,
    /// `true` while any fetch is in flight.
    pub loading: bool,
    /// Message of the last failed fetch; cleared whenever a fetch starts.
    pub error: Option<String>,
    /// Status of every page that was ever requested, by page number.
    pub statuses: BTreeMap<u32, PageStatus>,
    /// Number of cached pages.
    pub cached_pages: usize,
    /// Bumped on every change to cached records.
    pub revision: u64,
}

impl Default for CatalogSnapshot {
    fn default() -> Self {
        Self {
            total_pages: 1,
            total_books: 0,
            current_page: 1,
            loading: false,
            error: None,
            statuses: BTreeMap::new(),
            cached_pages: 0,
            revision: 0,
        }
    }
}

impl CatalogSnapshot {
    /// Status of `page`, if it was ever requested.
    #[must_use]
    pub fn status(&self, page: u32) -> Option<&PageStatus> {
        self.statuses.get(&page)
    }

    /// Whether `page` has a request in flight.
    #[must_use]
    pub fn is_loading(&self, page: u32) -> bool {
        self.status(page).is_some_and(PageStatus::is_loading)
    }
}
