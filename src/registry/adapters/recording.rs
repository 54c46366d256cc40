//! In-memory connection that records deliveries for tests and tooling.

use crate::envelope::domain::Envelope;
use crate::registry::ports::{AgentConnection, ConnectionError};
use std::sync::{Arc, Mutex, PoisonError};

/// Thread-safe connection that keeps every delivered envelope.
#[derive(Debug, Clone, Default)]
pub struct RecordingConnection {
    state: Arc<Mutex<RecordingState>>,
}

#[derive(Debug, Default)]
struct RecordingState {
    delivered: Vec<Envelope>,
    closed: Option<String>,
}

impl RecordingConnection {
    /// Creates an open connection with no deliveries.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every envelope delivered so far.
    #[must_use]
    pub fn delivered(&self) -> Vec<Envelope> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .delivered
            .clone()
    }

    /// Removes and returns every envelope delivered so far.
    #[must_use]
    pub fn drain(&self) -> Vec<Envelope> {
        std::mem::take(
            &mut self
                .state
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .delivered,
        )
    }

    /// Returns the close reason, if the connection was closed.
    #[must_use]
    pub fn closed_reason(&self) -> Option<String> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .closed
            .clone()
    }
}

impl AgentConnection for RecordingConnection {
    fn deliver(&self, envelope: Envelope) -> Result<(), ConnectionError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.closed.is_some() {
            return Err(ConnectionError::Closed);
        }
        state.delivered.push(envelope);
        Ok(())
    }

    fn close(&self, reason: &str) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.closed.is_none() {
            state.closed = Some(reason.to_owned());
        }
    }
}
