//! Error types and handling for bookshelf-core operations.
//!
//! A single error enum covers every failure the catalog store can surface.
//! The store itself applies different propagation policies per operation
//! (see [`crate::store::CatalogStore`]); this module only classifies.
//!
//! ## Error Categories
//!
//! - **Network Errors**: connection failures, timeouts, unreadable bodies
//! - **Request Failures**: the server answered a write with a non-2xx status
//! - **Parse Errors**: response bodies that do not match the expected shape
//! - **Configuration Errors**: unreadable or invalid config files, bad base URLs
//!
//! ## Recovery Hints
//!
//! ```rust
//! use bookshelf_core::Error;
//!
//! fn describe(err: &Error) -> String {
//!     if err.is_recoverable() {
//!         format!("temporary {} failure: {err}", err.category())
//!     } else {
//!         format!("permanent {} failure: {err}", err.category())
//!     }
//! }
//!
//! let err = Error::Config("missing [api] table".into());
//! assert!(describe(&err).starts_with("permanent config"));
//! ```

use reqwest::{Method, StatusCode};
use thiserror::Error;

/// The main error type for bookshelf-core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Network operation failed.
    ///
    /// Covers connection errors, timeouts, and bodies that could not be read
    /// off the wire. Bodies that arrive but are not valid JSON of the expected
    /// shape are [`Error::Parse`].
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered a request with a non-success status.
    ///
    /// Raised by the write operations (`DELETE`, `PUT`, `POST`) and by the
    /// list endpoint when it does not return 2xx.
    #[error("Request failed: {method} {url} returned {status}")]
    RequestFailed {
        /// HTTP method of the failed request.
        method: Method,
        /// Fully resolved request URL.
        url: String,
        /// Status code returned by the server.
        status: StatusCode,
    },

    /// A response body did not have the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration is invalid or inaccessible.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The configured API server is not a usable base URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

impl Error {
    /// Check if the error might be recoverable through retry logic.
    ///
    /// Connection failures, timeouts, and 5xx/429 responses are considered
    /// transient. The store never retries on its own; this is a hint for
    /// callers.
    ///
    /// ```rust
    /// use bookshelf_core::Error;
    /// use reqwest::{Method, StatusCode};
    ///
    /// let busy = Error::RequestFailed {
    ///     method: Method::DELETE,
    ///     url: "http://localhost:3005/api/books/1".into(),
    ///     status: StatusCode::SERVICE_UNAVAILABLE,
    /// };
    /// assert!(busy.is_recoverable());
    ///
    /// let gone = Error::RequestFailed {
    ///     method: Method::DELETE,
    ///     url: "http://localhost:3005/api/books/1".into(),
    ///     status: StatusCode::NOT_FOUND,
    /// };
    /// assert!(!gone.is_recoverable());
    /// ```
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_timeout() || e.is_connect(),
            Self::RequestFailed { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            },
            _ => false,
        }
    }

    /// Get the error category as a string identifier, for logging.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::RequestFailed { .. } => "request_failed",
            Self::Parse(_) => "parse",
            Self::Config(_) => "config",
            Self::InvalidUrl(_) => "invalid_url",
        }
    }

    /// HTTP status carried by the error, if the server produced one.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::RequestFailed { status, .. } => Some(*status),
            Self::Network(e) => e.status(),
            _ => None,
        }
    }
}

/// Convenience type alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
