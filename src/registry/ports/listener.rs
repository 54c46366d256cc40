//! Observer port notified when agents leave the registry.

use crate::registry::domain::{AgentHandle, DeregistrationReason};

/// Receives a callback for every successful deregistration.
///
/// Callbacks run on the deregistering task and must not block.
pub trait DeregistrationListener: Send + Sync {
    /// Called once after `agent` has been removed.
    fn on_deregistered(&self, agent: &AgentHandle, reason: DeregistrationReason);
}
