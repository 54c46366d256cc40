//! Resolved destinations of an envelope.

use crate::envelope::domain::AgentId;
use crate::graph::domain::GraphOperation;
use crate::spatial::domain::SpatialOperation;

/// Where an envelope is sent.
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    /// A single agent, addressed explicitly or chosen by capability.
    Agent(AgentId),
    /// The knowledge graph gateway.
    Graph(GraphOperation),
    /// The spatial query gateway.
    Spatial(SpatialOperation),
    /// Every listed agent; used for notifications only.
    Broadcast(Vec<AgentId>),
}

impl Route {
    /// Returns a short label for logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Agent(_) => "agent",
            Self::Graph(_) => "graph",
            Self::Spatial(_) => "spatial",
            Self::Broadcast(_) => "broadcast",
        }
    }
}
