//! Errors raised while loading and validating configuration.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Configuration failures. Every variant is fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration file {path}: {source}")]
    Read {
        /// File that was requested.
        path: Utf8PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for [`super::ServerConfig`].
    #[error("failed to parse configuration file {path}: {source}")]
    Parse {
        /// File that was parsed.
        path: Utf8PathBuf,
        /// Underlying TOML error.
        #[source]
        source: Box<toml::de::Error>,
    },

    /// An environment override could not be parsed.
    #[error("invalid value {value:?} for environment variable {key}")]
    Environment {
        /// Variable name.
        key: &'static str,
        /// Raw value.
        value: String,
    },

    /// A value is out of its allowed range.
    #[error("invalid configuration value for {field}: {reason}")]
    Invalid {
        /// Dotted configuration key.
        field: &'static str,
        /// Why the value was refused.
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
