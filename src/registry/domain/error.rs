//! Error types for registry domain validation.

use thiserror::Error;

/// Errors returned while constructing registry domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryDomainError {
    /// The capability name is empty.
    #[error("capability must not be empty")]
    EmptyCapability,

    /// The capability name exceeds the 128-character limit.
    #[error("capability exceeds 128 character limit: {0}")]
    CapabilityTooLong(String),

    /// The capability name contains whitespace.
    #[error("capability '{0}' must not contain whitespace")]
    CapabilityWhitespace(String),

    /// The capability name uses a server-owned namespace.
    #[error("capability '{0}' uses a reserved namespace")]
    ReservedCapability(String),
}

/// Error returned while parsing an agent status.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown agent status: {0}")]
pub struct ParseAgentStatusError(pub String);
