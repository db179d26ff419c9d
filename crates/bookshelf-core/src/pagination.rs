//! View-model over the store for paged listings.

use crate::store::CatalogStore;
use crate::status::CatalogSnapshot;
use crate::types::Book;
use std::sync::Arc;
use tokio::sync::watch;

/// Page number used by a fresh [`Pagination`].
pub const DEFAULT_PAGE: u32 = 1;
/// Page size used by a fresh [`Pagination`].
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Tracks the page a view is showing and delegates fetches to the store.
///
/// `total_pages` and `total_books` are read from the store's published
/// snapshot, so they follow whatever fetch completed last.
#[derive(Debug, Clone)]
pub struct Pagination {
    store: Arc<CatalogStore>,
    snapshot: watch::Receiver<CatalogSnapshot>,
    page: u32,
    page_size: u32,
}

impl Pagination {
    /// Start at page 1 with 10 records per page.
    #[must_use]
    pub fn new(store: Arc<CatalogStore>) -> Self {
        let snapshot = store.subscribe();
        Self {
            store,
            snapshot,
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Current page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Current page size.
    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Jump to `page`. Zero is clamped to 1.
    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    /// Change the page size. Zero is clamped to 1.
    pub fn set_page_size(&mut self, page_size: u32) {
        self.page_size = page_size.max(1);
    }

    /// Advance one page unless already on the last known page.
    ///
    /// Returns whether the page changed.
    pub fn next_page(&mut self) -> bool {
        if self.page < self.total_pages() {
            self.page += 1;
            true
        } else {
            false
        }
    }

    /// Go back one page unless already on the first.
    ///
    /// Returns whether the page changed.
    pub fn prev_page(&mut self) -> bool {
        if self.page > 1 {
            self.page -= 1;
            true
        } else {
            false
        }
    }

    /// Fetch the current page through the store.
    pub async fn fetch_books(&self) {
        self.store.fetch_page(self.page, self.page_size).await;
    }

    /// Records of the current page, from the cache.
    #[must_use]
    pub fn books(&self) -> Vec<Book> {
        self.store.get_cached_page(self.page)
    }

    /// Total pages as last reported by the server.
    #[must_use]
    pub fn total_pages(&self) -> u32 {
        self.snapshot.borrow().total_pages
    }

    /// Total books as exposed by the store.
    #[must_use]
    pub fn total_books(&self) -> u64 {
        self.snapshot.borrow().total_books
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &Arc<CatalogStore> {
        &self.store
    }
}
