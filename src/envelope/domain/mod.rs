//! Domain model for agent message envelopes.
//!
//! Envelopes are immutable value objects. Builder-style `with_*` methods
//! return new values so an envelope observed by one component cannot be
//! changed underneath another.

mod envelope;
mod error;
mod ids;
mod kind;
mod rpc_error;

pub(crate) use envelope::RESERVED_MEMBERS;
pub use envelope::Envelope;
pub use error::{
    EnvelopeDomainError, EnvelopeError, MalformedMessage, MalformedReason, ParseEnvelopeKindError,
};
pub use ids::{AgentId, CorrelationId};
pub use kind::EnvelopeKind;
pub use rpc_error::{ErrorCode, RpcError};
