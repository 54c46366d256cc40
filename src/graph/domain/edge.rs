//! Graph edges.

use super::{GraphDomainError, NodeId, Properties};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Relationship type of an edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EdgeType(String);

impl EdgeType {
    /// Creates a validated edge type.
    ///
    /// # Errors
    ///
    /// Returns [`GraphDomainError::EmptyEdgeType`] when the value is empty
    /// after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, GraphDomainError> {
        let raw = value.into();
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(GraphDomainError::EmptyEdgeType);
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Returns the type as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EdgeType {
    type Error = GraphDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EdgeType> for String {
    fn from(value: EdgeType) -> Self {
        value.0
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of an edge: source, target and relationship type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    /// Source node.
    pub from: NodeId,
    /// Target node.
    pub to: NodeId,
    /// Relationship type.
    pub edge_type: EdgeType,
}

/// A directed, typed edge with properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    from: NodeId,
    to: NodeId,
    #[serde(rename = "type")]
    edge_type: EdgeType,
    properties: Properties,
}

impl GraphEdge {
    /// Creates an edge.
    #[must_use]
    pub const fn new(from: NodeId, to: NodeId, edge_type: EdgeType, properties: Properties) -> Self {
        Self {
            from,
            to,
            edge_type,
            properties,
        }
    }

    /// Returns the source node.
    #[must_use]
    pub const fn source(&self) -> &NodeId {
        &self.from
    }

    /// Returns the target node.
    #[must_use]
    pub const fn target(&self) -> &NodeId {
        &self.to
    }

    /// Returns the relationship type.
    #[must_use]
    pub const fn edge_type(&self) -> &EdgeType {
        &self.edge_type
    }

    /// Returns the edge properties.
    #[must_use]
    pub const fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Returns the edge identity.
    #[must_use]
    pub fn key(&self) -> EdgeKey {
        EdgeKey {
            from: self.from.clone(),
            to: self.to.clone(),
            edge_type: self.edge_type.clone(),
        }
    }
}
