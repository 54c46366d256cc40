//! Connection backed by an unbounded channel drained by a writer task.

use crate::envelope::domain::Envelope;
use crate::registry::ports::{AgentConnection, ConnectionError};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Item consumed by a transport writer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Write the envelope to the peer.
    Envelope(Envelope),
    /// Flush and close the connection.
    Close(String),
}

/// [`AgentConnection`] that forwards to a transport writer task.
#[derive(Debug, Clone)]
pub struct ChannelConnection {
    sender: UnboundedSender<Outbound>,
}

impl ChannelConnection {
    /// Creates a connection and the receiver its writer task drains.
    #[must_use]
    pub fn new() -> (Self, UnboundedReceiver<Outbound>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Returns whether the writer task has gone away.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

impl AgentConnection for ChannelConnection {
    fn deliver(&self, envelope: Envelope) -> Result<(), ConnectionError> {
        self.sender
            .send(Outbound::Envelope(envelope))
            .map_err(|_| ConnectionError::Closed)
    }

    fn close(&self, reason: &str) {
        if self.sender.send(Outbound::Close(reason.to_owned())).is_err() {
            tracing::debug!(reason, "close requested on finished connection");
        }
    }
}
