//! Wire codec translating raw payloads to and from [`Envelope`] values.

use super::domain::{
    AgentId, CorrelationId, Envelope, EnvelopeKind, MalformedMessage, MalformedReason, RpcError,
};
use serde_json::{Map, Value};

/// Default upper bound on an inbound payload (1 MiB).
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 1024 * 1024;

const JSONRPC_VERSION: &str = "2.0";

/// Stateless JSON-RPC envelope codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvelopeCodec {
    max_message_bytes: usize,
}

impl Default for EnvelopeCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MESSAGE_BYTES)
    }
}

impl EnvelopeCodec {
    /// Creates a codec rejecting payloads above `max_message_bytes`.
    #[must_use]
    pub const fn new(max_message_bytes: usize) -> Self {
        Self { max_message_bytes }
    }

    /// Returns the configured payload limit.
    #[must_use]
    pub const fn max_message_bytes(&self) -> usize {
        self.max_message_bytes
    }

    /// Decodes and validates a raw payload.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedMessage`] when the payload is oversized, not JSON,
    /// or not a well-formed envelope. The error carries whatever correlation
    /// id could be salvaged from the payload.
    pub fn decode(&self, raw: &[u8]) -> Result<Envelope, MalformedMessage> {
        if raw.len() > self.max_message_bytes {
            return Err(MalformedMessage::new(
                MalformedReason::TooLarge {
                    actual_bytes: raw.len(),
                    limit_bytes: self.max_message_bytes,
                },
                None,
            ));
        }

        let value: Value = serde_json::from_slice(raw).map_err(|err| {
            MalformedMessage::new(MalformedReason::InvalidJson(err.to_string()), None)
        })?;

        let Value::Object(object) = value else {
            return Err(MalformedMessage::new(MalformedReason::NotAnObject, None));
        };

        let salvaged_id = object.get("id").and_then(CorrelationId::from_json);
        decode_object(object).map_err(|reason| MalformedMessage::new(reason, salvaged_id))
    }

    /// Serializes an envelope to its wire representation.
    #[must_use]
    pub fn encode(&self, envelope: &Envelope) -> Vec<u8> {
        self.encode_to_string(envelope).into_bytes()
    }

    /// Serializes an envelope to a JSON string.
    #[must_use]
    pub fn encode_to_string(&self, envelope: &Envelope) -> String {
        Value::Object(envelope_to_map(envelope)).to_string()
    }
}

fn envelope_to_map(envelope: &Envelope) -> Map<String, Value> {
    let mut map = Map::new();
    for (name, value) in envelope.extensions() {
        map.insert(name.clone(), value.clone());
    }

    map.insert("jsonrpc".to_owned(), Value::String(JSONRPC_VERSION.to_owned()));
    map.insert(
        "kind".to_owned(),
        Value::String(envelope.kind().as_str().to_owned()),
    );
    if let Some(method) = envelope.method() {
        map.insert("method".to_owned(), Value::String(method.to_owned()));
    }
    if let Some(params) = envelope.params() {
        map.insert("params".to_owned(), params.clone());
    }
    if let Some(id) = envelope.id() {
        map.insert("id".to_owned(), id.to_json());
    }
    if let Some(result) = envelope.result() {
        map.insert("result".to_owned(), result.clone());
    }
    if let Some(rpc_error) = envelope.rpc_error() {
        map.insert(
            "error".to_owned(),
            serde_json::to_value(rpc_error).unwrap_or(Value::Null),
        );
    }
    if let Some(sender) = envelope.sender() {
        map.insert("from".to_owned(), Value::String(sender.as_str().to_owned()));
    }
    if let Some(target) = envelope.target() {
        map.insert("to".to_owned(), Value::String(target.as_str().to_owned()));
    }
    map
}

/// Members extracted from an inbound object before kind validation.
struct RawMembers {
    kind: Option<EnvelopeKind>,
    method: Option<String>,
    params: Option<Value>,
    id: Option<CorrelationId>,
    result: Option<Value>,
    error: Option<Value>,
    sender: Option<AgentId>,
    target: Option<AgentId>,
}

fn decode_object(mut object: Map<String, Value>) -> Result<Envelope, MalformedReason> {
    match object.remove("jsonrpc") {
        Some(Value::String(version)) if version == JSONRPC_VERSION => {}
        _ => return Err(MalformedReason::UnsupportedVersion),
    }

    let members = RawMembers {
        kind: take_kind(&mut object)?,
        method: take_string(&mut object, "method")?,
        params: take_params(&mut object)?,
        id: take_id(&mut object)?,
        result: object.remove("result"),
        error: object.remove("error"),
        sender: take_agent(&mut object, "from")?,
        target: take_agent(&mut object, "to")?,
    };

    let kind = match members.kind {
        Some(kind) => kind,
        None => infer_kind(&members)?,
    };

    let envelope = build(kind, members)?;
    Ok(object
        .into_iter()
        .fold(envelope, |acc, (name, value)| acc.with_extension(name, value)))
}

fn take_kind(object: &mut Map<String, Value>) -> Result<Option<EnvelopeKind>, MalformedReason> {
    match object.remove("kind") {
        None => Ok(None),
        Some(Value::String(text)) => Ok(Some(EnvelopeKind::try_from(text.as_str())?)),
        Some(_) => Err(MalformedReason::InvalidMember("kind")),
    }
}

fn take_string(
    object: &mut Map<String, Value>,
    member: &'static str,
) -> Result<Option<String>, MalformedReason> {
    match object.remove(member) {
        None => Ok(None),
        Some(Value::String(text)) => Ok(Some(text)),
        Some(_) => Err(MalformedReason::InvalidMember(member)),
    }
}

fn take_params(object: &mut Map<String, Value>) -> Result<Option<Value>, MalformedReason> {
    match object.remove("params") {
        None => Ok(None),
        Some(params @ (Value::Object(_) | Value::Array(_))) => Ok(Some(params)),
        Some(_) => Err(MalformedReason::InvalidMember("params")),
    }
}

fn take_id(object: &mut Map<String, Value>) -> Result<Option<CorrelationId>, MalformedReason> {
    match object.remove("id") {
        None | Some(Value::Null) => Ok(None),
        Some(value) => CorrelationId::from_json(&value)
            .map(Some)
            .ok_or(MalformedReason::InvalidMember("id")),
    }
}

fn take_agent(
    object: &mut Map<String, Value>,
    member: &'static str,
) -> Result<Option<AgentId>, MalformedReason> {
    take_string(object, member)?
        .map(|text| {
            AgentId::new(text).map_err(|source| MalformedReason::InvalidAgentId { member, source })
        })
        .transpose()
}

const fn infer_kind(members: &RawMembers) -> Result<EnvelopeKind, MalformedReason> {
    if members.method.is_some() {
        if members.id.is_some() {
            return Ok(EnvelopeKind::Request);
        }
        return Ok(EnvelopeKind::Notification);
    }
    if members.result.is_some() {
        return Ok(EnvelopeKind::Response);
    }
    if members.error.is_some() {
        return Ok(EnvelopeKind::Error);
    }
    Err(MalformedReason::IndeterminateKind)
}

fn reject_member(
    present: bool,
    member: &'static str,
    kind: EnvelopeKind,
) -> Result<(), MalformedReason> {
    if present {
        return Err(MalformedReason::UnexpectedMember {
            member,
            kind: kind.as_str(),
        });
    }
    Ok(())
}

fn require_method(method: Option<String>, kind: EnvelopeKind) -> Result<String, MalformedReason> {
    method
        .filter(|name| !name.trim().is_empty())
        .ok_or(MalformedReason::MissingMethod(kind.as_str()))
}

fn build(kind: EnvelopeKind, members: RawMembers) -> Result<Envelope, MalformedReason> {
    let RawMembers {
        method,
        params,
        id,
        result,
        error,
        sender,
        target,
        ..
    } = members;

    let envelope = match kind {
        EnvelopeKind::Request | EnvelopeKind::Notification => {
            reject_member(result.is_some(), "result", kind)?;
            reject_member(error.is_some(), "error", kind)?;
            let method_name = require_method(method, kind)?;
            let call = if kind == EnvelopeKind::Request {
                let correlation_id = id.ok_or(MalformedReason::MissingCorrelationId("request"))?;
                Envelope::request(correlation_id, method_name)
            } else {
                if id.is_some() {
                    return Err(MalformedReason::UnexpectedCorrelationId);
                }
                Envelope::notification(method_name)
            };
            match params {
                Some(payload) => call.with_params(payload),
                None => call,
            }
        }
        EnvelopeKind::Response => {
            reject_member(method.is_some(), "method", kind)?;
            reject_member(params.is_some(), "params", kind)?;
            reject_member(error.is_some(), "error", kind)?;
            let correlation_id = id.ok_or(MalformedReason::MissingCorrelationId("response"))?;
            let payload = result.ok_or(MalformedReason::MissingResult)?;
            Envelope::response(correlation_id, payload)
        }
        EnvelopeKind::Error => {
            reject_member(method.is_some(), "method", kind)?;
            reject_member(params.is_some(), "params", kind)?;
            reject_member(result.is_some(), "result", kind)?;
            let correlation_id = id.ok_or(MalformedReason::MissingCorrelationId("error"))?;
            let rpc_error = error
                .and_then(|value| serde_json::from_value::<RpcError>(value).ok())
                .ok_or(MalformedReason::InvalidErrorObject)?;
            Envelope::error(correlation_id, rpc_error)
        }
    };

    let with_sender = match sender {
        Some(agent) => envelope.with_sender(agent),
        None => envelope,
    };
    Ok(match target {
        Some(agent) => with_sender.with_target(agent),
        None => with_sender,
    })
}
