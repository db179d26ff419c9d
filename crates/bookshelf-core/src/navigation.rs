//! Binding to the host's navigation location.
//!
//! Fetching a page mirrors `page` and `page_size` into the current location's
//! query string. The store only knows this trait; routers implement it.

use crate::types::PageQuery;
use std::sync::Mutex;

/// Receives the query parameters of every page fetch.
pub trait Navigator: Send + Sync {
    /// Replace the location's `page`/`page_size` query parameters.
    fn push_query(&self, query: &PageQuery);
}

/// Navigator that ignores every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn push_query(&self, _query: &PageQuery) {}
}

/// Navigator that remembers every pushed query, in order.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    history: Mutex<Vec<PageQuery>>,
}

impl RecordingNavigator {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every query pushed so far.
    #[must_use]
    pub fn history(&self) -> Vec<PageQuery> {
        self.history
            .lock()
            .map(|h| h.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// The most recently pushed query.
    #[must_use]
    pub fn current(&self) -> Option<PageQuery> {
        self.history().last().copied()
    }
}

impl Navigator for RecordingNavigator {
    fn push_query(&self, query: &PageQuery) {
        let mut history = self
            .history
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        history.push(*query);
    }
}
