//! Error types for session domain rules.

use super::SessionState;
use thiserror::Error;

/// A state change the session lifecycle does not allow.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("invalid session transition from {from} to {to}")]
pub struct InvalidSessionTransition {
    /// State before the attempted change.
    pub from: SessionState,
    /// Requested state.
    pub to: SessionState,
}

/// Errors returned while parsing `agent.*` commands.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionDomainError {
    /// The method names no `agent.*` command.
    #[error("unknown agent command: {0}")]
    UnknownCommand(String),

    /// The parameters do not match the command's shape.
    #[error("invalid params: {0}")]
    InvalidParams(String),
}
