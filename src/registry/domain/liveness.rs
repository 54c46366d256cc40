//! Liveness sweep outcomes and registry statistics.

use crate::envelope::domain::AgentId;
use serde::Serialize;
use std::fmt;

/// Agents whose liveness changed during a sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LivenessReport {
    /// Agents moved from `active` to `degraded`.
    pub degraded: Vec<AgentId>,
    /// Agents silent for two heartbeat intervals, due for deregistration.
    pub expired: Vec<AgentId>,
}

impl LivenessReport {
    /// Returns whether the sweep changed nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.degraded.is_empty() && self.expired.is_empty()
    }
}

/// Agent counts reported on the health surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    /// Total registered agents.
    pub agents: usize,
    /// Agents in `active` status.
    pub active: usize,
    /// Agents in `degraded` status.
    pub degraded: usize,
}

/// Why an agent left the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeregistrationReason {
    /// The agent asked to disconnect.
    Disconnect,
    /// The agent missed two heartbeat intervals.
    HeartbeatExpired,
    /// The underlying connection failed or closed.
    TransportClosed,
    /// The server is shutting down.
    Shutdown,
}

impl DeregistrationReason {
    /// Returns the canonical representation used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnect => "disconnect",
            Self::HeartbeatExpired => "heartbeat_expired",
            Self::TransportClosed => "transport_closed",
            Self::Shutdown => "shutdown",
        }
    }
}

impl fmt::Display for DeregistrationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
