//! Cloneable snapshot of a registered agent.

use super::{AgentStatus, Capability};
use crate::envelope::domain::{AgentId, Envelope};
use crate::registry::ports::{AgentConnection, ConnectionError};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Point-in-time view of a registered agent.
///
/// Handles are cheap to clone and share the agent's connection, so a
/// component holding one can deliver envelopes without touching the
/// registry again. Status and heartbeat values reflect the moment the
/// snapshot was taken.
#[derive(Clone)]
pub struct AgentHandle {
    id: AgentId,
    capabilities: Arc<BTreeSet<Capability>>,
    status: AgentStatus,
    registered_at: DateTime<Utc>,
    last_heartbeat: DateTime<Utc>,
    connection: Arc<dyn AgentConnection>,
}

impl AgentHandle {
    /// Creates a snapshot from its parts.
    #[must_use]
    pub fn new(
        id: AgentId,
        capabilities: Arc<BTreeSet<Capability>>,
        status: AgentStatus,
        registered_at: DateTime<Utc>,
        last_heartbeat: DateTime<Utc>,
        connection: Arc<dyn AgentConnection>,
    ) -> Self {
        Self {
            id,
            capabilities,
            status,
            registered_at,
            last_heartbeat,
            connection,
        }
    }

    /// Returns the agent identifier.
    #[must_use]
    pub const fn id(&self) -> &AgentId {
        &self.id
    }

    /// Returns the declared capabilities.
    #[must_use]
    pub fn capabilities(&self) -> &BTreeSet<Capability> {
        &self.capabilities
    }

    /// Returns whether the agent declared the capability.
    #[must_use]
    pub fn serves(&self, capability: &Capability) -> bool {
        self.capabilities.contains(capability)
    }

    /// Returns the status at snapshot time.
    #[must_use]
    pub const fn status(&self) -> AgentStatus {
        self.status
    }

    /// Returns when the agent registered.
    #[must_use]
    pub const fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }

    /// Returns when the agent last heartbeated.
    #[must_use]
    pub const fn last_heartbeat(&self) -> DateTime<Utc> {
        self.last_heartbeat
    }

    /// Returns whether the snapshot belongs to the given connection.
    #[must_use]
    pub fn is_bound_to(&self, connection: &Arc<dyn AgentConnection>) -> bool {
        Arc::ptr_eq(&self.connection, connection)
    }

    /// Returns a copy with a different status.
    #[must_use]
    pub fn with_status(mut self, status: AgentStatus) -> Self {
        self.status = status;
        self
    }

    /// Delivers an envelope over the agent's connection.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError`] when the connection is already closed.
    pub fn deliver(&self, envelope: Envelope) -> Result<(), ConnectionError> {
        self.connection.deliver(envelope)
    }

    /// Asks the agent's connection to close.
    pub fn close(&self, reason: &str) {
        self.connection.close(reason);
    }
}

impl fmt::Debug for AgentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentHandle")
            .field("id", &self.id)
            .field("capabilities", &self.capabilities)
            .field("status", &self.status)
            .field("registered_at", &self.registered_at)
            .field("last_heartbeat", &self.last_heartbeat)
            .finish_non_exhaustive()
    }
}
