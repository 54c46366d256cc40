//! Normalized graph operation results.

use super::{GraphEdge, GraphNode, NodeId};
use serde_json::{Value, json};
use std::collections::BTreeSet;

/// Outcome of a successful graph operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphResult {
    /// The node written by an upsert.
    Node(GraphNode),
    /// The edge written by an upsert.
    Edge(GraphEdge),
    /// Nodes and edges returned by a query.
    Subgraph {
        /// Nodes in traversal order.
        nodes: Vec<GraphNode>,
        /// Edges in traversal order.
        edges: Vec<GraphEdge>,
    },
}

impl GraphResult {
    /// Returns an empty subgraph.
    #[must_use]
    pub const fn empty() -> Self {
        Self::Subgraph {
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Returns every node id the result covers.
    #[must_use]
    pub fn node_ids(&self) -> BTreeSet<NodeId> {
        match self {
            Self::Node(node) => BTreeSet::from([node.id().clone()]),
            Self::Edge(edge) => BTreeSet::from([edge.source().clone(), edge.target().clone()]),
            Self::Subgraph { nodes, edges } => nodes
                .iter()
                .map(|node| node.id().clone())
                .chain(
                    edges
                        .iter()
                        .flat_map(|edge| [edge.source().clone(), edge.target().clone()]),
                )
                .collect(),
        }
    }

    /// Returns the JSON result delivered to the calling agent.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Node(node) => json!({ "node": node }),
            Self::Edge(edge) => json!({ "edge": edge }),
            Self::Subgraph { nodes, edges } => json!({ "nodes": nodes, "edges": edges }),
        }
    }
}
