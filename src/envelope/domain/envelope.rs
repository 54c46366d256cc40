//! The message envelope exchanged between agents and the server.

use super::{AgentId, CorrelationId, EnvelopeKind, ErrorCode, RpcError};
use serde_json::Value;
use std::collections::BTreeMap;

/// Top-level wire members owned by the envelope itself.
pub(crate) const RESERVED_MEMBERS: [&str; 9] = [
    "jsonrpc", "kind", "method", "params", "id", "result", "error", "from", "to",
];

/// A single JSON-RPC-shaped message.
///
/// Envelopes are immutable values: the `with_*` methods consume the
/// envelope and return an updated copy.
///
/// # Invariants
///
/// - requests carry a method and a correlation id
/// - notifications carry a method and never a correlation id
/// - responses carry a result (possibly JSON `null`) and a correlation id
/// - errors carry an error object and a correlation id
///
/// # Examples
///
/// ```
/// use agora::envelope::domain::{AgentId, Envelope, EnvelopeKind};
/// use serde_json::json;
///
/// let sender = AgentId::new("geo1").expect("valid id");
/// let envelope = Envelope::request(7, "spatial.nearestTo")
///     .with_params(json!({"point": [10.0, 20.0], "crs": "EPSG:4326", "k": 3}))
///     .with_sender(sender);
///
/// assert_eq!(envelope.kind(), EnvelopeKind::Request);
/// assert_eq!(envelope.method(), Some("spatial.nearestTo"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    kind: EnvelopeKind,
    method: Option<String>,
    params: Option<Value>,
    id: Option<CorrelationId>,
    result: Option<Value>,
    error: Option<RpcError>,
    sender: Option<AgentId>,
    target: Option<AgentId>,
    extensions: BTreeMap<String, Value>,
}

impl Envelope {
    const fn empty(kind: EnvelopeKind) -> Self {
        Self {
            kind,
            method: None,
            params: None,
            id: None,
            result: None,
            error: None,
            sender: None,
            target: None,
            extensions: BTreeMap::new(),
        }
    }

    /// Creates a request envelope.
    #[must_use]
    pub fn request(id: impl Into<CorrelationId>, method: impl Into<String>) -> Self {
        Self {
            method: Some(method.into()),
            id: Some(id.into()),
            ..Self::empty(EnvelopeKind::Request)
        }
    }

    /// Creates a notification envelope.
    #[must_use]
    pub fn notification(method: impl Into<String>) -> Self {
        Self {
            method: Some(method.into()),
            ..Self::empty(EnvelopeKind::Notification)
        }
    }

    /// Creates a successful response envelope.
    #[must_use]
    pub fn response(id: impl Into<CorrelationId>, result: Value) -> Self {
        Self {
            id: Some(id.into()),
            result: Some(result),
            ..Self::empty(EnvelopeKind::Response)
        }
    }

    /// Creates an error envelope.
    #[must_use]
    pub fn error(id: impl Into<CorrelationId>, error: RpcError) -> Self {
        Self {
            id: Some(id.into()),
            error: Some(error),
            ..Self::empty(EnvelopeKind::Error)
        }
    }

    /// Creates an error envelope for a taxonomy code with optional detail.
    #[must_use]
    pub fn error_code(
        id: impl Into<CorrelationId>,
        code: ErrorCode,
        detail: Option<String>,
    ) -> Self {
        let rpc_error = match detail {
            Some(text) => RpcError::from_code(code).with_detail(text),
            None => RpcError::from_code(code),
        };
        Self::error(id, rpc_error)
    }

    /// Returns a copy carrying the given parameters.
    #[must_use]
    pub fn with_params(mut self, params: Value) -> Self {
        self.params = Some(params);
        self
    }

    /// Returns a copy carrying the given correlation id.
    ///
    /// Notifications never carry an id, so the call is ignored for them.
    #[must_use]
    pub fn with_id(mut self, id: CorrelationId) -> Self {
        if self.kind != EnvelopeKind::Notification {
            self.id = Some(id);
        }
        self
    }

    /// Returns a copy whose `from` member is the given agent.
    #[must_use]
    pub fn with_sender(mut self, sender: AgentId) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Returns a copy whose `to` member is the given agent.
    #[must_use]
    pub fn with_target(mut self, target: AgentId) -> Self {
        self.target = Some(target);
        self
    }

    /// Returns a copy carrying an opaque top-level member.
    ///
    /// Names owned by the envelope (`jsonrpc`, `method`, `id`, ...) are
    /// ignored.
    #[must_use]
    pub fn with_extension(mut self, name: impl Into<String>, value: Value) -> Self {
        let key = name.into();
        if !RESERVED_MEMBERS.contains(&key.as_str()) {
            self.extensions.insert(key, value);
        }
        self
    }

    /// Returns the envelope kind.
    #[must_use]
    pub const fn kind(&self) -> EnvelopeKind {
        self.kind
    }

    /// Returns the method name, if any.
    #[must_use]
    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    /// Returns the parameter payload, if any.
    #[must_use]
    pub const fn params(&self) -> Option<&Value> {
        self.params.as_ref()
    }

    /// Returns the correlation id, if any.
    #[must_use]
    pub const fn id(&self) -> Option<&CorrelationId> {
        self.id.as_ref()
    }

    /// Returns the result payload of a response.
    #[must_use]
    pub const fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    /// Returns the error object of an error envelope.
    #[must_use]
    pub const fn rpc_error(&self) -> Option<&RpcError> {
        self.error.as_ref()
    }

    /// Returns the sending agent, if known.
    #[must_use]
    pub const fn sender(&self) -> Option<&AgentId> {
        self.sender.as_ref()
    }

    /// Returns the addressed agent, if any.
    #[must_use]
    pub const fn target(&self) -> Option<&AgentId> {
        self.target.as_ref()
    }

    /// Returns the preserved unknown top-level members.
    #[must_use]
    pub const fn extensions(&self) -> &BTreeMap<String, Value> {
        &self.extensions
    }
}
