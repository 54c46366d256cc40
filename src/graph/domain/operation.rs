//! Agent-facing graph operations parsed from `graph.*` envelopes.

use super::{EdgeType, GraphDomainError, NodeId, Properties};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::collections::BTreeSet;

/// Deepest neighborhood a single query may expand.
pub const MAX_NEIGHBOR_DEPTH: u8 = 5;

const UPSERT_NODE: &str = "graph.upsertNode";
const UPSERT_EDGE: &str = "graph.upsertEdge";
const QUERY_NEIGHBORS: &str = "graph.queryNeighbors";
const QUERY_PATH: &str = "graph.queryPath";

/// A validated graph operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphOperation {
    /// Create or replace a node.
    UpsertNode {
        /// Node identifier.
        id: NodeId,
        /// Replacement label set.
        labels: BTreeSet<String>,
        /// Replacement properties.
        properties: Properties,
    },
    /// Create or replace an edge between two existing nodes.
    UpsertEdge {
        /// Source node.
        from: NodeId,
        /// Target node.
        to: NodeId,
        /// Relationship type.
        edge_type: EdgeType,
        /// Replacement properties.
        properties: Properties,
    },
    /// Expand the neighborhood around a node.
    QueryNeighbors {
        /// Centre node.
        id: NodeId,
        /// Number of hops, `1..=5`.
        depth: u8,
    },
    /// Find a shortest path between two nodes.
    QueryPath {
        /// Source node.
        from: NodeId,
        /// Target node.
        to: NodeId,
    },
}

#[derive(Deserialize)]
struct UpsertNodeParams {
    id: String,
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default)]
    properties: Properties,
}

#[derive(Deserialize)]
struct UpsertEdgeParams {
    from: String,
    to: String,
    #[serde(rename = "type")]
    edge_type: String,
    #[serde(default)]
    properties: Properties,
}

#[derive(Deserialize)]
struct QueryNeighborsParams {
    id: String,
    depth: Option<u64>,
}

#[derive(Deserialize)]
struct QueryPathParams {
    from: String,
    to: String,
}

fn decode<T: DeserializeOwned>(params: Option<&Value>) -> Result<T, GraphDomainError> {
    let payload = params.cloned().unwrap_or_else(|| json!({}));
    serde_json::from_value(payload).map_err(|err| GraphDomainError::InvalidParams(err.to_string()))
}

impl GraphOperation {
    /// Every method name served by the graph gateway.
    pub const METHODS: [&'static str; 4] = [UPSERT_NODE, UPSERT_EDGE, QUERY_NEIGHBORS, QUERY_PATH];

    /// Parses a `graph.*` method and its parameters.
    ///
    /// # Errors
    ///
    /// Returns [`GraphDomainError::UnknownOperation`] for unknown methods and
    /// a validation error when the parameters are malformed.
    pub fn parse(method: &str, params: Option<&Value>) -> Result<Self, GraphDomainError> {
        match method {
            UPSERT_NODE => {
                let raw: UpsertNodeParams = decode(params)?;
                let labels = raw
                    .labels
                    .into_iter()
                    .map(|label| {
                        let trimmed = label.trim().to_owned();
                        if trimmed.is_empty() {
                            Err(GraphDomainError::EmptyLabel)
                        } else {
                            Ok(trimmed)
                        }
                    })
                    .collect::<Result<BTreeSet<_>, _>>()?;
                Ok(Self::UpsertNode {
                    id: NodeId::new(raw.id)?,
                    labels,
                    properties: raw.properties,
                })
            }
            UPSERT_EDGE => {
                let raw: UpsertEdgeParams = decode(params)?;
                Ok(Self::UpsertEdge {
                    from: NodeId::new(raw.from)?,
                    to: NodeId::new(raw.to)?,
                    edge_type: EdgeType::new(raw.edge_type)?,
                    properties: raw.properties,
                })
            }
            QUERY_NEIGHBORS => {
                let raw: QueryNeighborsParams = decode(params)?;
                let requested = raw.depth.unwrap_or(1);
                let depth = u8::try_from(requested)
                    .ok()
                    .filter(|value| (1..=MAX_NEIGHBOR_DEPTH).contains(value))
                    .ok_or(GraphDomainError::DepthOutOfRange(requested))?;
                Ok(Self::QueryNeighbors {
                    id: NodeId::new(raw.id)?,
                    depth,
                })
            }
            QUERY_PATH => {
                let raw: QueryPathParams = decode(params)?;
                Ok(Self::QueryPath {
                    from: NodeId::new(raw.from)?,
                    to: NodeId::new(raw.to)?,
                })
            }
            other => Err(GraphDomainError::UnknownOperation(other.to_owned())),
        }
    }

    /// Returns the method name of the operation.
    #[must_use]
    pub const fn method(&self) -> &'static str {
        match self {
            Self::UpsertNode { .. } => UPSERT_NODE,
            Self::UpsertEdge { .. } => UPSERT_EDGE,
            Self::QueryNeighbors { .. } => QUERY_NEIGHBORS,
            Self::QueryPath { .. } => QUERY_PATH,
        }
    }

    /// Returns whether the operation changes the graph.
    #[must_use]
    pub const fn is_mutation(&self) -> bool {
        matches!(self, Self::UpsertNode { .. } | Self::UpsertEdge { .. })
    }

    /// Returns the node ids a mutation touches.
    #[must_use]
    pub fn touched_nodes(&self) -> Vec<NodeId> {
        match self {
            Self::UpsertNode { id, .. } => vec![id.clone()],
            Self::UpsertEdge { from, to, .. } => vec![from.clone(), to.clone()],
            Self::QueryNeighbors { .. } | Self::QueryPath { .. } => Vec::new(),
        }
    }

    /// Returns a canonical JSON form used for cache signatures.
    #[must_use]
    pub fn canonical_params(&self) -> Value {
        match self {
            Self::UpsertNode {
                id,
                labels,
                properties,
            } => json!({"id": id, "labels": labels, "properties": properties}),
            Self::UpsertEdge {
                from,
                to,
                edge_type,
                properties,
            } => json!({"from": from, "to": to, "type": edge_type, "properties": properties}),
            Self::QueryNeighbors { id, depth } => json!({"id": id, "depth": depth}),
            Self::QueryPath { from, to } => json!({"from": from, "to": to}),
        }
    }
}
