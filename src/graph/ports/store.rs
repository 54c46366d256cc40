//! Graph store port consumed by the gateway.

use crate::graph::domain::{EdgeType, GraphEdge, GraphNode, GraphResult, NodeId, Properties};
use crate::retry::Retryable;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;

/// Result type for graph store operations.
pub type GraphStoreResult<T> = Result<T, GraphStoreError>;

/// Graph query and mutation contract.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Creates or replaces a node.
    ///
    /// # Errors
    ///
    /// Returns [`GraphStoreError::Unavailable`] when the store cannot be
    /// reached.
    async fn upsert_node(
        &self,
        id: NodeId,
        labels: BTreeSet<String>,
        properties: Properties,
    ) -> GraphStoreResult<GraphNode>;

    /// Creates or replaces the edge identified by `(from, to, edge_type)`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphStoreError::Query`] when either endpoint does not
    /// exist.
    async fn upsert_edge(
        &self,
        from: NodeId,
        to: NodeId,
        edge_type: EdgeType,
        properties: Properties,
    ) -> GraphStoreResult<GraphEdge>;

    /// Returns the nodes and edges within `depth` hops of `id`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphStoreError::Query`] when the node does not exist.
    async fn query_neighbors(&self, id: NodeId, depth: u8) -> GraphStoreResult<GraphResult>;

    /// Returns a shortest path from `from` to `to`, empty when unreachable.
    ///
    /// # Errors
    ///
    /// Returns [`GraphStoreError::Query`] when either node does not exist.
    async fn query_path(&self, from: NodeId, to: NodeId) -> GraphStoreResult<GraphResult>;

    /// Checks that the store is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`GraphStoreError::Unavailable`] when the store cannot be
    /// reached.
    async fn ping(&self) -> GraphStoreResult<()>;
}

/// Errors returned by graph store implementations.
#[derive(Debug, Clone, Error)]
pub enum GraphStoreError {
    /// The store could not be reached.
    #[error("graph store unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),

    /// The store rejected the operation.
    #[error("graph query failed: {0}")]
    Query(String),
}

impl GraphStoreError {
    /// Wraps a connectivity error.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }

    /// Creates a query rejection with a server-authored reason.
    pub fn query(reason: impl Into<String>) -> Self {
        Self::Query(reason.into())
    }
}

impl Retryable for GraphStoreError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}
