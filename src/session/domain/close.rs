//! Why a session ended.

use crate::registry::domain::DeregistrationReason;
use std::fmt;

/// Reason a session entered `closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloseReason {
    /// The agent sent `agent.disconnect`.
    Disconnect,
    /// The agent stayed silent for two heartbeat intervals.
    HeartbeatExpired,
    /// The transport failed or the peer went away.
    TransportClosed,
    /// No handshake arrived in time.
    HandshakeTimeout,
    /// The handshake was refused.
    HandshakeRejected,
    /// The server is stopping.
    Shutdown,
}

impl CloseReason {
    /// Returns the canonical representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnect => "disconnect",
            Self::HeartbeatExpired => "heartbeat_expired",
            Self::TransportClosed => "transport_closed",
            Self::HandshakeTimeout => "handshake_timeout",
            Self::HandshakeRejected => "handshake_rejected",
            Self::Shutdown => "shutdown",
        }
    }

    /// Returns the registry reason recorded when a registered agent leaves.
    #[must_use]
    pub const fn deregistration_reason(self) -> DeregistrationReason {
        match self {
            Self::Disconnect => DeregistrationReason::Disconnect,
            Self::HeartbeatExpired => DeregistrationReason::HeartbeatExpired,
            Self::Shutdown => DeregistrationReason::Shutdown,
            Self::TransportClosed | Self::HandshakeTimeout | Self::HandshakeRejected => {
                DeregistrationReason::TransportClosed
            }
        }
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
