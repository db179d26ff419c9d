//! Configuration for the catalog store.
//!
//! Configuration is stored in TOML format. Values are resolved in order:
//!
//! 1. Built-in defaults
//! 2. `config.toml` in the platform config directory (or an explicit path)
//! 3. Environment variables (`BOOKSHELF_API_SERVER`)
//!
//! ## Example Configuration File
//!
//! ```toml
//! [api]
//! server = "http://localhost:3005/api/"
//! timeout_secs = 30
//!
//! [compat]
//! total_books_offset = 10
//! filter_window = 10
//!
//! [logging]
//! level = "warn"
//! format = "pretty"
//! ```
//!
//! ```rust
//! use bookshelf_core::Config;
//!
//! let config = Config::default();
//! assert_eq!(config.api.server, "http://localhost:3005/api/");
//! assert_eq!(config.compat.total_books_offset, 10);
//! let base = config.api.base_url()?;
//! assert_eq!(base.join("books")?.as_str(), "http://localhost:3005/api/books");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Environment variable that overrides [`ApiConfig::server`].
pub const API_SERVER_ENV: &str = "BOOKSHELF_API_SERVER";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// REST API connection settings
    pub api: ApiConfig,
    /// Behaviors kept for parity with the catalog web client
    pub compat: CompatConfig,
    /// Log output settings for hosts that call [`crate::telemetry::init_logging`]
    pub logging: LoggingConfig,
}

/// REST API connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL for all requests (the `apiServer` option).
    pub server: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            server: "http://localhost:3005/api/".to_string(),
            timeout_secs: 30,
        }
    }
}

impl ApiConfig {
    /// Parse [`ApiConfig::server`] as a base URL.
    ///
    /// A trailing `/` is added when missing so that joining `books` keeps
    /// the last path segment of the base.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the server is not an absolute
    /// `http`/`https` URL.
    pub fn base_url(&self) -> Result<Url> {
        let trimmed = self.server.trim();
        let normalized = if trimmed.ends_with('/') {
            trimmed.to_string()
        } else {
            format!("{trimmed}/")
        };
        let url = Url::parse(&normalized)?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(Error::InvalidUrl(format!(
                "unsupported scheme '{other}' in API server '{trimmed}'"
            ))),
        }
    }

    /// Request timeout as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Settings that reproduce quirks of the original catalog client.
///
/// Both default to `10`, matching the web client the store was modelled on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompatConfig {
    /// Added to `meta.total` when computing `total_books`.
    pub total_books_offset: u64,
    /// Window size used by title filtering, independent of the page size.
    pub filter_window: usize,
}

impl Default for CompatConfig {
    fn default() -> Self {
        Self {
            total_books_offset: 10,
            filter_window: 10,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Maximum level: `error`, `warn`, `info`, `debug` or `trace`.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl Config {
    /// Load configuration from the default location, or defaults if absent.
    ///
    /// Environment overrides are applied in both cases.
    ///
    /// # Errors
    ///
    /// Returns an error if the config directory cannot be determined or the
    /// file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let config = if path.exists() {
            Self::read_file(&path)?
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Self::default()
        };
        Ok(config.with_env_overrides())
    }

    /// Load configuration from an explicit file, applying env overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_path(path: &Path) -> Result<Self> {
        Ok(Self::read_file(path)?.with_env_overrides())
    }

    /// Write the configuration as pretty TOML, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config directory: {e}")))?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {e}")))?;
        fs::write(path, content)
            .map_err(|e| Error::Config(format!("Failed to write config: {e}")))?;
        Ok(())
    }

    /// Apply environment variable overrides.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(std::env::var(API_SERVER_ENV).ok())
    }

    fn with_overrides(mut self, api_server: Option<String>) -> Self {
        if let Some(server) = api_server.filter(|s| !s.trim().is_empty()) {
            tracing::debug!("API server overridden by {API_SERVER_ENV}: {server}");
            self.api.server = server;
        }
        self
    }

    fn read_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config: {e}")))?;
        toml::from_str(&content).map_err(|e| Error::Config(format!("Failed to parse config: {e}")))
    }

    /// Path of the global configuration file.
    ///
    /// - Linux: `~/.config/bookshelf/config.toml`
    /// - macOS: `~/Library/Application Support/dev.bookshelf.bookshelf/config.toml`
    /// - Windows: `%APPDATA%\bookshelf\bookshelf\config\config.toml`
    ///
    /// # Errors
    ///
    /// Returns an error if the platform config directory cannot be determined.
    pub fn config_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("dev", "bookshelf", "bookshelf")
            .ok_or_else(|| Error::Config("Failed to determine project directories".into()))?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api.server, "http://localhost:3005/api/");
        assert_eq!(config.api.timeout(), Duration::from_secs(30));
        assert_eq!(config.compat.total_books_offset, 10);
        assert_eq!(config.compat.filter_window, 10);
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_base_url_adds_trailing_slash() {
        let api = ApiConfig {
            server: "http://example.test/api".to_string(),
            ..ApiConfig::default()
        };
        let base = api.base_url().unwrap();
        assert_eq!(base.as_str(), "http://example.test/api/");
        assert_eq!(
            base.join("books/5").unwrap().as_str(),
            "http://example.test/api/books/5"
        );
    }

    #[test]
    fn test_base_url_rejects_garbage() {
        let api = ApiConfig {
            server: "not a url".to_string(),
            ..ApiConfig::default()
        };
        assert!(matches!(api.base_url(), Err(Error::InvalidUrl(_))));

        let api = ApiConfig {
            server: "ftp://example.test/".to_string(),
            ..ApiConfig::default()
        };
        assert!(matches!(api.base_url(), Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[compat]\nfilter_window = 25\n").unwrap();

        let config = Config::read_file(&path).unwrap();
        assert_eq!(config.compat.filter_window, 25);
        assert_eq!(config.compat.total_books_offset, 10);
        assert_eq!(config.api, ApiConfig::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.api.server = "https://books.example.test/v2/".to_string();
        config.logging.format = LogFormat::Json;
        config.save_to(&path).unwrap();

        let reloaded = Config::read_file(&path).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[api\nserver = ").unwrap();
        assert!(matches!(Config::read_file(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let result = Config::from_path(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_server_override() {
        let config = Config::default().with_overrides(Some("http://other:8080/api/".into()));
        assert_eq!(config.api.server, "http://other:8080/api/");

        let config = Config::default().with_overrides(Some("   ".into()));
        assert_eq!(config.api.server, "http://localhost:3005/api/");

        let config = Config::default().with_overrides(None);
        assert_eq!(config.api.server, "http://localhost:3005/api/");
    }
}
