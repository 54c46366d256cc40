//! In-flight calls awaiting a reply.

use crate::envelope::domain::{AgentId, CorrelationId};
use chrono::{DateTime, Utc};
use std::fmt;

/// The party expected to answer a pending call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CallTarget {
    /// An agent; only that agent's reply settles the call.
    Agent(AgentId),
    /// The knowledge graph gateway.
    Graph,
    /// The spatial query gateway.
    Spatial,
}

impl CallTarget {
    /// Returns the agent, when the target is one.
    #[must_use]
    pub const fn agent(&self) -> Option<&AgentId> {
        match self {
            Self::Agent(id) => Some(id),
            Self::Graph | Self::Spatial => None,
        }
    }
}

impl fmt::Display for CallTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Agent(id) => write!(f, "agent:{id}"),
            Self::Graph => f.write_str("graph"),
            Self::Spatial => f.write_str("spatial"),
        }
    }
}

/// Router-side record of a forwarded request.
///
/// Calls are never mutated; they are inserted once and removed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCall {
    forwarded_id: CorrelationId,
    originator: AgentId,
    original_id: CorrelationId,
    target: CallTarget,
    method: String,
    issued_at: DateTime<Utc>,
    deadline: DateTime<Utc>,
}

impl PendingCall {
    /// Creates a pending call.
    #[must_use]
    pub const fn new(
        forwarded_id: CorrelationId,
        originator: AgentId,
        original_id: CorrelationId,
        target: CallTarget,
        method: String,
        issued_at: DateTime<Utc>,
        deadline: DateTime<Utc>,
    ) -> Self {
        Self {
            forwarded_id,
            originator,
            original_id,
            target,
            method,
            issued_at,
            deadline,
        }
    }

    /// Returns the id the target sees.
    #[must_use]
    pub const fn forwarded_id(&self) -> &CorrelationId {
        &self.forwarded_id
    }

    /// Returns the requesting agent.
    #[must_use]
    pub const fn originator(&self) -> &AgentId {
        &self.originator
    }

    /// Returns the id the originator chose.
    #[must_use]
    pub const fn original_id(&self) -> &CorrelationId {
        &self.original_id
    }

    /// Returns the party expected to answer.
    #[must_use]
    pub const fn target(&self) -> &CallTarget {
        &self.target
    }

    /// Returns the forwarded method.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Returns when the call was forwarded.
    #[must_use]
    pub const fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// Returns when the call times out.
    #[must_use]
    pub const fn deadline(&self) -> DateTime<Utc> {
        self.deadline
    }

    /// Returns whether the deadline has elapsed at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.deadline
    }
}
