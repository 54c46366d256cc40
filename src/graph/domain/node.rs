//! Graph nodes.

use super::GraphDomainError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;

/// Free-form node or edge properties.
pub type Properties = Map<String, Value>;

/// Identifier of a node in the knowledge graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeId(String);

impl NodeId {
    /// Creates a validated node identifier.
    ///
    /// # Errors
    ///
    /// Returns [`GraphDomainError::EmptyNodeId`] when the value is empty
    /// after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, GraphDomainError> {
        let raw = value.into();
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(GraphDomainError::EmptyNodeId);
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for NodeId {
    type Error = GraphDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NodeId> for String {
    fn from(value: NodeId) -> Self {
        value.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A node with its labels and properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    id: NodeId,
    labels: BTreeSet<String>,
    properties: Properties,
}

impl GraphNode {
    /// Creates a node.
    #[must_use]
    pub const fn new(id: NodeId, labels: BTreeSet<String>, properties: Properties) -> Self {
        Self {
            id,
            labels,
            properties,
        }
    }

    /// Returns the node identifier.
    #[must_use]
    pub const fn id(&self) -> &NodeId {
        &self.id
    }

    /// Returns the node labels.
    #[must_use]
    pub const fn labels(&self) -> &BTreeSet<String> {
        &self.labels
    }

    /// Returns the node properties.
    #[must_use]
    pub const fn properties(&self) -> &Properties {
        &self.properties
    }
}
