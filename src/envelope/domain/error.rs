//! Error types for envelope construction and decoding.

use super::{CorrelationId, ErrorCode, RpcError};
use thiserror::Error;

/// Errors returned while constructing envelope domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EnvelopeDomainError {
    /// The agent identifier is empty after trimming.
    #[error("agent id must not be empty")]
    EmptyAgentId,

    /// The agent identifier contains unsupported characters.
    #[error(
        "agent id '{0}' contains invalid characters (only ASCII alphanumerics and '-', '_', '.', ':' allowed)"
    )]
    InvalidAgentId(String),

    /// The agent identifier exceeds the 128-character limit.
    #[error("agent id exceeds 128 character limit: {0}")]
    AgentIdTooLong(String),
}

/// Error returned while parsing an envelope kind.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown envelope kind: {0}")]
pub struct ParseEnvelopeKindError(pub String);

/// Reasons an inbound payload is rejected by the codec.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MalformedReason {
    /// The payload is not valid JSON.
    #[error("payload is not valid JSON: {0}")]
    InvalidJson(String),

    /// The payload is valid JSON but not an object.
    #[error("payload must be a JSON object")]
    NotAnObject,

    /// The payload exceeds the configured size limit.
    #[error("payload size {actual_bytes} exceeds limit of {limit_bytes} bytes")]
    TooLarge {
        /// The actual size in bytes.
        actual_bytes: usize,
        /// The maximum allowed size.
        limit_bytes: usize,
    },

    /// The `jsonrpc` member is missing or not `"2.0"`.
    #[error("jsonrpc version must be \"2.0\"")]
    UnsupportedVersion,

    /// The `kind` member names none of the four envelope kinds.
    #[error(transparent)]
    UnknownKind(#[from] ParseEnvelopeKindError),

    /// The envelope shape matches no kind.
    #[error("envelope carries neither method, result nor error")]
    IndeterminateKind,

    /// A member has the wrong JSON type.
    #[error("member '{0}' has an invalid type")]
    InvalidMember(&'static str),

    /// A request or notification has an empty method.
    #[error("{0} must carry a non-empty method")]
    MissingMethod(&'static str),

    /// A request, response or error lacks a correlation id.
    #[error("{0} must carry a correlation id")]
    MissingCorrelationId(&'static str),

    /// A notification carries a correlation id.
    #[error("notification must not carry a correlation id")]
    UnexpectedCorrelationId,

    /// A member is not allowed for the envelope kind.
    #[error("member '{member}' is not allowed on a {kind}")]
    UnexpectedMember {
        /// Offending member name.
        member: &'static str,
        /// Envelope kind in canonical form.
        kind: &'static str,
    },

    /// A response lacks a result.
    #[error("response must carry a result")]
    MissingResult,

    /// An error envelope lacks a well-formed error object.
    #[error("error must carry an object with integer code and string message")]
    InvalidErrorObject,

    /// A `from` or `to` member is not a valid agent id.
    #[error("member '{member}' is not a valid agent id: {source}")]
    InvalidAgentId {
        /// Offending member name.
        member: &'static str,
        /// Validation failure.
        source: EnvelopeDomainError,
    },
}

/// A rejected inbound payload.
///
/// Carries the correlation id the codec could salvage, if any, so the
/// connection can answer with an `error` envelope instead of dropping the
/// message.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("malformed message: {reason}")]
pub struct MalformedMessage {
    reason: MalformedReason,
    correlation_id: Option<CorrelationId>,
}

impl MalformedMessage {
    /// Creates a malformed-message error.
    #[must_use]
    pub const fn new(reason: MalformedReason, correlation_id: Option<CorrelationId>) -> Self {
        Self {
            reason,
            correlation_id,
        }
    }

    /// Returns why the payload was rejected.
    #[must_use]
    pub const fn reason(&self) -> &MalformedReason {
        &self.reason
    }

    /// Returns the salvaged correlation id, if any.
    #[must_use]
    pub const fn correlation_id(&self) -> Option<&CorrelationId> {
        self.correlation_id.as_ref()
    }

    /// Returns the stable error code for this rejection.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self.reason {
            MalformedReason::InvalidJson(_) => ErrorCode::ParseError,
            _ => ErrorCode::MalformedMessage,
        }
    }

    /// Builds the wire error object for this rejection.
    #[must_use]
    pub fn to_rpc_error(&self) -> RpcError {
        RpcError::from_code(self.error_code()).with_detail(self.reason.to_string())
    }
}

/// Errors surfaced by the envelope layer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    /// An inbound payload was rejected by the codec.
    #[error(transparent)]
    Malformed(#[from] MalformedMessage),

    /// A domain value failed validation.
    #[error(transparent)]
    Domain(#[from] EnvelopeDomainError),
}

impl EnvelopeError {
    /// Maps the error into the stable taxonomy.
    #[must_use]
    pub const fn to_error_code(&self) -> ErrorCode {
        match self {
            Self::Malformed(malformed) => malformed.error_code(),
            Self::Domain(_) => ErrorCode::InvalidParams,
        }
    }
}
