//! Agent lifecycle status.

use super::ParseAgentStatusError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    /// The connection is open but the handshake has not completed.
    Connecting,
    /// The agent is registered and heartbeating.
    Active,
    /// The agent missed a heartbeat interval.
    Degraded,
    /// The agent has been removed from the registry.
    Disconnected,
}

impl AgentStatus {
    /// Returns the canonical wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Active => "active",
            Self::Degraded => "degraded",
            Self::Disconnected => "disconnected",
        }
    }

    /// Returns whether the agent may be selected for routing.
    #[must_use]
    pub const fn is_routable(self) -> bool {
        matches!(self, Self::Active | Self::Degraded)
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for AgentStatus {
    type Error = ParseAgentStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "connecting" => Ok(Self::Connecting),
            "active" => Ok(Self::Active),
            "degraded" => Ok(Self::Degraded),
            "disconnected" => Ok(Self::Disconnected),
            _ => Err(ParseAgentStatusError(value.to_owned())),
        }
    }
}
