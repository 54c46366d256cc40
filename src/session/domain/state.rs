//! Session lifecycle states.

use super::InvalidSessionTransition;
use std::fmt;

/// Lifecycle state of one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Connected, handshake not yet completed.
    Connecting,
    /// Registered and heartbeating.
    Active,
    /// Registered but a heartbeat was missed.
    Degraded,
    /// Terminal.
    Closed,
}

impl SessionState {
    /// Returns the canonical representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Active => "active",
            Self::Degraded => "degraded",
            Self::Closed => "closed",
        }
    }

    /// Returns whether the session completed its handshake and is open.
    #[must_use]
    pub const fn is_registered(self) -> bool {
        matches!(self, Self::Active | Self::Degraded)
    }

    /// Returns whether `self → to` is a legal transition.
    #[must_use]
    pub const fn can_transition_to(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Connecting, Self::Active | Self::Closed)
                | (Self::Active, Self::Degraded | Self::Closed)
                | (Self::Degraded, Self::Active | Self::Closed)
        )
    }

    /// Returns the target state when the transition is legal.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidSessionTransition`] for any other change, including
    /// every change out of `closed`.
    pub const fn transition(self, to: Self) -> Result<Self, InvalidSessionTransition> {
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err(InvalidSessionTransition { from: self, to })
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
