//! Error types for router domain parsing.

use thiserror::Error;

/// Error returned while parsing a selection policy.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown selection policy: {0}")]
pub struct ParseSelectionPolicyError(pub String);
