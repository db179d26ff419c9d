//! Logging initialization for host applications.
//!
//! The library itself only emits `tracing` events. Hosts that do not install
//! their own subscriber call [`init_logging`] once at startup.

use crate::config::{LogFormat, LoggingConfig};
use crate::{Error, Result};
use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Parse a level name such as `warn` or `DEBUG`.
///
/// # Errors
///
/// Returns [`Error::Config`] for unknown level names.
pub fn parse_level(level: &str) -> Result<Level> {
    Level::from_str(level.trim())
        .map_err(|_| Error::Config(format!("Unknown log level '{level}'")))
}

/// Install a global fmt subscriber writing to stderr.
///
/// # Errors
///
/// Returns an error if the level is invalid or a global subscriber is
/// already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let level = parse_level(&config.level)?;
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr);

    let installed = match config.format {
        LogFormat::Pretty => tracing::subscriber::set_global_default(builder.finish()),
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish()),
    };
    installed.map_err(|e| Error::Config(format!("Failed to install log subscriber: {e}")))
}
