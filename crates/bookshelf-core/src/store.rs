//! The catalog store: page cache, pagination metadata and request status.
//!
//! One [`CatalogStore`] lives for the whole session. Hosts share it by
//! `Arc` and call its async operations from their event loop; every method
//! takes `&self`, and internal state is only locked between suspension
//! points.
//!
//! ## Error propagation
//!
//! The operations deliberately differ in how failures reach the caller:
//!
//! | Operation | On failure |
//! |---|---|
//! | [`fetch_page`](CatalogStore::fetch_page) | recorded in [`error`](CatalogStore::error), never returned |
//! | [`delete_book`](CatalogStore::delete_book) | logged and returned |
//! | [`add_book`](CatalogStore::add_book) | logged and returned |
//! | [`update_book`](CatalogStore::update_book) | logged and swallowed |
//! | [`try_update_book`](CatalogStore::try_update_book) | returned |
//!
//! ## Example
//!
//! ```rust,no_run
//! use bookshelf_core::{CatalogStore, Config};
//!
//! # async fn demo() -> bookshelf_core::Result<()> {
//! let store = CatalogStore::new(&Config::load()?)?;
//! store.fetch_page(1, 10).await;
//! if let Some(message) = store.error() {
//!     eprintln!("{message}");
//! }
//! for book in store.get_cached_page(1) {
//!     println!("{} {}", book.id, book.title().unwrap_or("(untitled)"));
//! }
//! # Ok(())
//! # }
//! ```

use crate::api::CatalogApi;
use crate::config::{CompatConfig, Config};
use crate::navigation::{Navigator, NoopNavigator};
use crate::page_cache::PageCache;
use crate::status::{CatalogSnapshot, PageStatus};
use crate::types::{Book, BookId, BookPatch, NewBook, PageQuery, PageResponse};
use crate::Result;
use chrono::Utc;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::watch;
use tracing::{debug, error, info};

/// Message exposed through [`CatalogStore::error`] when a page fetch fails.
pub const FETCH_ERROR_MESSAGE: &str = "Failed to fetch books for the page.";

#[derive(Debug, Default)]
struct StoreState {
    pages: PageCache,
    view: CatalogSnapshot,
    in_flight: usize,
}

enum FetchStart {
    Cached,
    InFlight,
    Started,
}

/// Session-wide cache of catalog pages backed by the REST API.
pub struct CatalogStore {
    api: CatalogApi,
    compat: CompatConfig,
    navigator: Arc<dyn Navigator>,
    state: RwLock<StoreState>,
    snapshot: watch::Sender<CatalogSnapshot>,
}

impl std::fmt::Debug for CatalogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogStore")
            .field("api", &self.api)
            .field("compat", &self.compat)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl CatalogStore {
    /// Create a store from configuration, with no navigation binding.
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self::with_api(CatalogApi::new(&config.api)?, config.compat))
    }

    /// Create a store around an existing API client.
    #[must_use]
    pub fn with_api(api: CatalogApi, compat: CompatConfig) -> Self {
        let (snapshot, _) = watch::channel(CatalogSnapshot::default());
        Self {
            api,
            compat,
            navigator: Arc::new(NoopNavigator),
            state: RwLock::new(StoreState::default()),
            snapshot,
        }
    }

    /// Mirror every page fetch into `navigator`.
    #[must_use]
    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    /// Make sure `page` is cached.
    ///
    /// A cached page returns immediately, without a request and without
    /// touching metadata. If another call is already fetching `page`, this
    /// waits for it instead of sending a second request. Otherwise the page
    /// is requested, stored verbatim, and `total_pages`, `total_books` and
    /// `current_page` are taken from the response.
    ///
    /// Failures are never returned: they set [`error`](Self::error) to
    /// [`FETCH_ERROR_MESSAGE`] and are logged.
    pub async fn fetch_page(&self, page: u32, page_size: u32) {
        match self.begin_fetch(page) {
            FetchStart::Cached => {
                debug!("Page {page} already cached");
                return;
            },
            FetchStart::InFlight => {
                debug!("Page {page} already loading, waiting");
                self.wait_until_settled(page).await;
                return;
            },
            FetchStart::Started => {},
        }

        let guard = FetchGuard { store: self, page };
        self.navigator.push_query(&PageQuery { page, page_size });

        match self.api.list_books(page, page_size).await {
            Ok(response) => self.store_page(page, response),
            Err(err) => {
                error!("Failed to fetch page {page}: {err}");
                let mut state = self.state_mut();
                state.view.error = Some(FETCH_ERROR_MESSAGE.to_string());
                state.view.statuses.insert(
                    page,
                    PageStatus::Failed {
                        message: FETCH_ERROR_MESSAGE.to_string(),
                    },
                );
            },
        }
        drop(guard);
    }

    /// Delete a record on the server, then from every cached page.
    ///
    /// On failure the cache is left untouched and the error is returned.
    pub async fn delete_book(&self, id: BookId) -> Result<()> {
        if let Err(err) = self.api.delete_book(id).await {
            error!("Error deleting book {id}: {err}");
            return Err(err);
        }

        let touched = {
            let mut state = self.state_mut();
            let touched = state.pages.remove_book(id);
            if !touched.is_empty() {
                state.view.revision += 1;
            }
            self.publish(&state);
            touched
        };
        info!("Deleted book {id}, removed from pages {touched:?}");
        Ok(())
    }

    /// Update a record, logging and discarding any failure.
    ///
    /// Callers that need the outcome use [`try_update_book`](Self::try_update_book).
    pub async fn update_book(&self, id: BookId, patch: &BookPatch) {
        if let Err(err) = self.try_update_book(id, patch).await {
            error!("Error updating book {id}: {err}");
        }
    }

    /// Update a record on the server and replace it in every cached page.
    ///
    /// On each cached page the first record with `id` is replaced by the
    /// server's representation, in place. On failure the cache is untouched.
    pub async fn try_update_book(&self, id: BookId, patch: &BookPatch) -> Result<Book> {
        let updated = self.api.update_book(id, patch).await?;

        let touched = {
            let mut state = self.state_mut();
            let touched = state.pages.replace_book(id, &updated);
            if !touched.is_empty() {
                state.view.revision += 1;
            }
            self.publish(&state);
            touched
        };
        info!("Updated book {id} on pages {touched:?}");
        Ok(updated)
    }

    /// Create a record on the server.
    ///
    /// The created record is returned but not inserted into any cached
    /// page; callers invalidate and re-fetch to see it in a listing.
    pub async fn add_book(&self, book: &NewBook) -> Result<Book> {
        match self.api.create_book(book).await {
            Ok(created) => {
                info!("Added book {} ({:?})", created.id, created.title());
                Ok(created)
            },
            Err(err) => {
                error!("Error adding book: {err}");
                Err(err)
            },
        }
    }

    /// Flip the favorite flag of a cached record.
    ///
    /// The first cached record with `id` (pages in insertion order) is sent
    /// back in full with `isFavorite` inverted, through
    /// [`update_book`](Self::update_book). Does nothing if `id` is not cached.
    pub async fn toggle_favorite(&self, id: BookId) {
        let patch = self
            .state()
            .pages
            .find(id)
            .map(|book| BookPatch::from_book(book).favorite(!book.is_favorite()));

        match patch {
            Some(patch) => self.update_book(id, &patch).await,
            None => debug!("Book {id} not cached, nothing to toggle"),
        }
    }

    /// Records cached for `page`, or an empty list. Never fetches.
    #[must_use]
    pub fn get_cached_page(&self, page: u32) -> Vec<Book> {
        self.state().pages.get(page).map(<[Book]>::to_vec).unwrap_or_default()
    }

    /// Title search across every cached page.
    ///
    /// Matches are windowed by the configured `filter_window`, not by the
    /// page size used for fetching.
    #[must_use]
    pub fn get_filtered_books(&self, page: u32, query: &str) -> Vec<Book> {
        self.state()
            .pages
            .filtered(query, page, self.compat.filter_window)
    }

    /// Every cached record, pages in the order they were first cached.
    #[must_use]
    pub fn get_all_cached_pages(&self) -> Vec<Book> {
        self.state().pages.iter_books().cloned().collect()
    }

    /// Drop one cached page so the next fetch requests it again.
    pub fn invalidate_page(&self, page: u32) {
        let mut state = self.state_mut();
        if state.pages.invalidate(page).is_some() {
            state.view.revision += 1;
        }
        if !state.view.is_loading(page) {
            state.view.statuses.remove(&page);
        }
        self.publish(&state);
        debug!("Invalidated page {page}");
    }

    /// Drop every cached page.
    pub fn invalidate_all(&self) {
        let mut state = self.state_mut();
        if !state.pages.is_empty() {
            state.view.revision += 1;
        }
        state.pages.clear();
        state.view.statuses.retain(|_, status| status.is_loading());
        self.publish(&state);
        debug!("Invalidated all pages");
    }

    /// `meta.total_pages` of the most recent successful fetch.
    #[must_use]
    pub fn total_pages(&self) -> u32 {
        self.state().view.total_pages
    }

    /// `meta.total` of the most recent successful fetch plus the compat offset.
    #[must_use]
    pub fn total_books(&self) -> u64 {
        self.state().view.total_books
    }

    /// `meta.current_page` of the most recent successful fetch.
    #[must_use]
    pub fn current_page(&self) -> u32 {
        self.state().view.current_page
    }

    /// Whether any fetch is in flight.
    #[must_use]
    pub fn loading(&self) -> bool {
        self.state().in_flight > 0
    }

    /// Message of the last failed fetch, if no fetch has started since.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.state().view.error.clone()
    }

    /// Status of a single page, if it was ever requested.
    #[must_use]
    pub fn page_status(&self, page: u32) -> Option<PageStatus> {
        self.state().view.status(page).cloned()
    }

    /// Current state as a snapshot.
    #[must_use]
    pub fn snapshot(&self) -> CatalogSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Receiver that observes every published snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CatalogSnapshot> {
        self.snapshot.subscribe()
    }

    fn begin_fetch(&self, page: u32) -> FetchStart {
        let mut state = self.state_mut();
        if state.pages.contains(page) {
            return FetchStart::Cached;
        }
        if state.view.is_loading(page) {
            return FetchStart::InFlight;
        }
        state.in_flight += 1;
        state.view.error = None;
        state.view.statuses.insert(page, PageStatus::Loading);
        self.publish(&state);
        FetchStart::Started
    }

    fn store_page(&self, page: u32, response: PageResponse) {
        let PageResponse { data, meta } = response;
        let count = data.len();
        let mut state = self.state_mut();
        state.pages.insert(page, data);
        state.view.total_pages = meta.total_pages;
        state.view.total_books = meta.total.saturating_add(self.compat.total_books_offset);
        state.view.current_page = meta.current_page;
        state.view.revision += 1;
        state.view.statuses.insert(
            page,
            PageStatus::Ready {
                fetched_at: Utc::now(),
            },
        );
        info!(
            "Cached page {page} ({count} books, {} pages total)",
            meta.total_pages
        );
    }

    fn finish_fetch(&self, page: u32) {
        let mut state = self.state_mut();
        state.in_flight = state.in_flight.saturating_sub(1);
        // Still loading here means the fetch was dropped before it settled
        if state.view.is_loading(page) {
            state.view.statuses.remove(&page);
        }
        self.publish(&state);
    }

    async fn wait_until_settled(&self, page: u32) {
        let mut rx = self.snapshot.subscribe();
        let settled = rx.wait_for(|s| !s.is_loading(page)).await.is_ok();
        if !settled {
            debug!("Snapshot channel closed while waiting for page {page}");
        }
    }

    fn publish(&self, state: &StoreState) {
        let mut view = state.view.clone();
        view.loading = state.in_flight > 0;
        view.cached_pages = state.pages.len();
        self.snapshot.send_replace(view);
    }

    fn state(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn state_mut(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Settles an in-flight fetch on every exit path, including cancellation.
struct FetchGuard<'a> {
    store: &'a CatalogStore,
    page: u32,
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        self.store.finish_fetch(self.page);
    }
}
