//! Error types for graph domain validation.

use thiserror::Error;

/// Errors returned while parsing graph operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GraphDomainError {
    /// The method names no graph operation.
    #[error("unknown graph operation: {0}")]
    UnknownOperation(String),

    /// The parameters do not match the operation's shape.
    #[error("invalid params: {0}")]
    InvalidParams(String),

    /// A node identifier is empty after trimming.
    #[error("node id must not be empty")]
    EmptyNodeId,

    /// An edge type is empty after trimming.
    #[error("edge type must not be empty")]
    EmptyEdgeType,

    /// A label is empty after trimming.
    #[error("labels must not be empty strings")]
    EmptyLabel,

    /// The neighbor depth is outside `1..=5`.
    #[error("depth must be between 1 and 5, got {0}")]
    DepthOutOfRange(u64),
}
