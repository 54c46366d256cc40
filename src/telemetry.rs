//! Structured logging setup.
//!
//! `RUST_LOG` wins when set; otherwise the configured level applies.

use crate::config::{LogFormat, LoggingSection};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Failures while installing the global subscriber.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TelemetryError {
    /// The filter directive could not be parsed.
    #[error("invalid log filter {directive:?}: {reason}")]
    Filter {
        /// Directive that failed.
        directive: String,
        /// Parser message.
        reason: String,
    },

    /// A global subscriber was already installed.
    #[error("failed to install the log subscriber: {0}")]
    Install(String),
}

/// Builds the filter from `RUST_LOG`, falling back to `logging.level`.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] when the fallback directive is
/// malformed.
pub fn build_filter(logging: &LoggingSection) -> Result<EnvFilter, TelemetryError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(logging.level.as_str()).map_err(|err| TelemetryError::Filter {
        directive: logging.level.clone(),
        reason: err.to_string(),
    })
}

/// Installs the global `tracing` subscriber.
///
/// # Errors
///
/// Returns [`TelemetryError`] when the filter is malformed or a subscriber
/// is already installed.
pub fn init(logging: &LoggingSection) -> Result<(), TelemetryError> {
    let filter = build_filter(logging)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = match logging.format {
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().flatten_event(true).try_init(),
    };
    installed.map_err(|err| TelemetryError::Install(err.to_string()))
}
