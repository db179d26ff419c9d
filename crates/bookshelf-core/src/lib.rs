//! # bookshelf-core
//!
//! Client-side state for the bookshelf catalog: a paginated, session-long
//! cache in front of the catalog REST API, with observable request status
//! for UI layers.
//!
//! ## Architecture
//!
//! - **API**: [`CatalogApi`] talks to `GET/POST /books` and `PUT/DELETE /books/:id`
//! - **Page cache**: [`PageCache`] keeps fetched pages in insertion order
//! - **Store**: [`CatalogStore`] owns the cache, pagination metadata and
//!   request status, and keeps cached pages in step with writes
//! - **Pagination**: [`Pagination`] is the per-view page/page-size helper
//! - **Navigation**: [`Navigator`] mirrors fetched pages into the host's location
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use bookshelf_core::{CatalogStore, Config, Pagination};
//!
//! # async fn demo() -> bookshelf_core::Result<()> {
//! let store = Arc::new(CatalogStore::new(&Config::load()?)?);
//! let mut view = Pagination::new(Arc::clone(&store));
//!
//! view.fetch_books().await;
//! println!("{} books on {} pages", view.total_books(), view.total_pages());
//!
//! if view.next_page() {
//!     view.fetch_books().await;
//! }
//! for book in view.books() {
//!     println!("{} {}", book.id, book.title().unwrap_or("(untitled)"));
//! }
//! # Ok(())
//! # }
//! ```

/// REST client for the catalog endpoints
pub mod api;
/// Configuration loading and defaults
pub mod config;
/// Error types and result aliases
pub mod error;
/// Navigation location binding
pub mod navigation;
/// Insertion-ordered page cache
pub mod page_cache;
/// Page/page-size view helper
pub mod pagination;
/// Request status and observable snapshots
pub mod status;
/// The catalog store
pub mod store;
/// Logging setup for hosts
pub mod telemetry;
/// Core data types
pub mod types;

pub use api::CatalogApi;
pub use config::{ApiConfig, CompatConfig, Config, LogFormat, LoggingConfig};
pub use error::{Error, Result};
pub use navigation::{Navigator, NoopNavigator, RecordingNavigator};
pub use page_cache::PageCache;
pub use pagination::Pagination;
pub use status::{CatalogSnapshot, PageStatus};
pub use store::{CatalogStore, FETCH_ERROR_MESSAGE};
pub use types::*;
