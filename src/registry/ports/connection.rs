//! Outbound half of an agent connection.

use crate::envelope::domain::Envelope;
use thiserror::Error;

/// Delivery contract for a connected agent.
///
/// Implementations enqueue envelopes without waiting for the peer, so the
/// router can deliver from any task without blocking on a slow socket.
pub trait AgentConnection: Send + Sync {
    /// Queues an envelope for delivery to the agent.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::Closed`] when the connection has already
    /// shut down.
    fn deliver(&self, envelope: Envelope) -> Result<(), ConnectionError>;

    /// Asks the connection to close after flushing queued envelopes.
    fn close(&self, reason: &str);
}

/// Errors returned by connection implementations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConnectionError {
    /// The connection no longer accepts envelopes.
    #[error("connection closed")]
    Closed,
}
