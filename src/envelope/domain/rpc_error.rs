//! Stable error taxonomy and the wire error object.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Stable error codes surfaced to agents.
///
/// Each code carries a numeric JSON-RPC code, a snake_case kind placed in
/// `error.data.kind`, and a fixed human-readable message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The payload is not valid JSON.
    ParseError,
    /// The payload is JSON but not a well-formed envelope.
    MalformedMessage,
    /// No route exists for the method.
    MethodNotFound,
    /// The method parameters failed validation.
    InvalidParams,
    /// An unexpected server-side failure.
    Internal,
    /// The addressed agent is not registered.
    UnknownAgent,
    /// The agent identifier is already registered.
    DuplicateAgent,
    /// The peer disconnected before answering.
    PeerUnavailable,
    /// The call deadline elapsed.
    Timeout,
    /// Handshake credentials were rejected.
    Unauthorized,
    /// The session has not completed its handshake.
    HandshakeRequired,
    /// The graph store cannot be reached.
    GraphStoreUnavailable,
    /// The graph store rejected the operation.
    GraphQueryError,
    /// The spatial store cannot be reached.
    SpatialStoreUnavailable,
    /// The spatial store rejected the query.
    SpatialQueryError,
    /// The coordinate reference system is not supported.
    UnsupportedCrs,
}

impl ErrorCode {
    /// Every code in the taxonomy.
    pub const ALL: [Self; 16] = [
        Self::ParseError,
        Self::MalformedMessage,
        Self::MethodNotFound,
        Self::InvalidParams,
        Self::Internal,
        Self::UnknownAgent,
        Self::DuplicateAgent,
        Self::PeerUnavailable,
        Self::Timeout,
        Self::Unauthorized,
        Self::HandshakeRequired,
        Self::GraphStoreUnavailable,
        Self::GraphQueryError,
        Self::SpatialStoreUnavailable,
        Self::SpatialQueryError,
        Self::UnsupportedCrs,
    ];

    /// Returns the numeric JSON-RPC code.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::ParseError => -32700,
            Self::MalformedMessage => -32600,
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::Internal => -32603,
            Self::UnknownAgent => -32001,
            Self::DuplicateAgent => -32002,
            Self::PeerUnavailable => -32003,
            Self::Timeout => -32004,
            Self::Unauthorized => -32005,
            Self::HandshakeRequired => -32006,
            Self::GraphStoreUnavailable => -32010,
            Self::GraphQueryError => -32011,
            Self::SpatialStoreUnavailable => -32020,
            Self::SpatialQueryError => -32021,
            Self::UnsupportedCrs => -32022,
        }
    }

    /// Returns the stable snake_case kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ParseError => "parse_error",
            Self::MalformedMessage => "malformed_message",
            Self::MethodNotFound => "method_not_found",
            Self::InvalidParams => "invalid_params",
            Self::Internal => "internal_error",
            Self::UnknownAgent => "unknown_agent",
            Self::DuplicateAgent => "duplicate_agent",
            Self::PeerUnavailable => "peer_unavailable",
            Self::Timeout => "timeout",
            Self::Unauthorized => "unauthorized",
            Self::HandshakeRequired => "handshake_required",
            Self::GraphStoreUnavailable => "graph_store_unavailable",
            Self::GraphQueryError => "graph_query_error",
            Self::SpatialStoreUnavailable => "spatial_store_unavailable",
            Self::SpatialQueryError => "spatial_query_error",
            Self::UnsupportedCrs => "unsupported_crs",
        }
    }

    /// Returns the fixed human-readable message.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ParseError => "Parse error",
            Self::MalformedMessage => "Invalid request",
            Self::MethodNotFound => "Method not found",
            Self::InvalidParams => "Invalid params",
            Self::Internal => "Internal error",
            Self::UnknownAgent => "Unknown agent",
            Self::DuplicateAgent => "Duplicate agent",
            Self::PeerUnavailable => "Peer unavailable",
            Self::Timeout => "Call timed out",
            Self::Unauthorized => "Unauthorized",
            Self::HandshakeRequired => "Handshake required",
            Self::GraphStoreUnavailable => "Graph store unavailable",
            Self::GraphQueryError => "Graph query error",
            Self::SpatialStoreUnavailable => "Spatial store unavailable",
            Self::SpatialQueryError => "Spatial query error",
            Self::UnsupportedCrs => "Unsupported CRS",
        }
    }

    /// Finds the code with the given numeric value.
    #[must_use]
    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|candidate| candidate.code() == code)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JSON-RPC error object carried by `error` envelopes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcError {
    /// Numeric error code.
    pub code: i64,
    /// Human-readable message.
    pub message: String,
    /// Optional structured data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    /// Builds the wire object for a taxonomy code.
    ///
    /// The stable kind is placed in `data.kind`.
    #[must_use]
    pub fn from_code(code: ErrorCode) -> Self {
        let mut data = Map::new();
        data.insert("kind".to_owned(), Value::String(code.as_str().to_owned()));
        Self {
            code: code.code(),
            message: code.message().to_owned(),
            data: Some(Value::Object(data)),
        }
    }

    /// Adds server-authored detail under `data.detail`.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        let detail_value = Value::String(detail.into());
        match &mut self.data {
            Some(Value::Object(map)) => {
                map.insert("detail".to_owned(), detail_value);
            }
            _ => {
                let mut map = Map::new();
                map.insert("detail".to_owned(), detail_value);
                self.data = Some(Value::Object(map));
            }
        }
        self
    }

    /// Returns the taxonomy code when the numeric code is known.
    #[must_use]
    pub fn error_code(&self) -> Option<ErrorCode> {
        ErrorCode::from_code(self.code)
    }

    /// Returns the stable kind from `data.kind`, if present.
    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        self.data
            .as_ref()
            .and_then(|data| data.get("kind"))
            .and_then(Value::as_str)
    }

    /// Returns the detail from `data.detail`, if present.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        self.data
            .as_ref()
            .and_then(|data| data.get("detail"))
            .and_then(Value::as_str)
    }
}

impl From<ErrorCode> for RpcError {
    fn from(code: ErrorCode) -> Self {
        Self::from_code(code)
    }
}
