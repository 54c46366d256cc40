//! In-memory graph store.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::{Arc, RwLock};

use crate::graph::{
    domain::{EdgeKey, EdgeType, GraphEdge, GraphNode, GraphResult, NodeId, Properties},
    ports::{GraphStore, GraphStoreError, GraphStoreResult},
};

/// Thread-safe in-memory graph store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGraphStore {
    state: Arc<RwLock<InMemoryGraphState>>,
}

#[derive(Debug, Default)]
struct InMemoryGraphState {
    nodes: BTreeMap<NodeId, GraphNode>,
    edges: BTreeMap<EdgeKey, GraphEdge>,
}

impl InMemoryGraphState {
    fn require(&self, id: &NodeId) -> GraphStoreResult<()> {
        if self.nodes.contains_key(id) {
            Ok(())
        } else {
            Err(GraphStoreError::query(format!("node '{id}' does not exist")))
        }
    }

    fn neighbors(&self, centre: &NodeId, depth: u8) -> GraphResult {
        let mut order = vec![centre.clone()];
        let mut seen = BTreeSet::from([centre.clone()]);
        let mut frontier = vec![centre.clone()];

        for _ in 0..depth {
            let mut next = Vec::new();
            for current in &frontier {
                for edge in self.edges.values() {
                    let adjacent = if edge.source() == current {
                        edge.target()
                    } else if edge.target() == current {
                        edge.source()
                    } else {
                        continue;
                    };
                    if seen.insert(adjacent.clone()) {
                        order.push(adjacent.clone());
                        next.push(adjacent.clone());
                    }
                }
            }
            frontier = next;
        }

        let nodes = order
            .iter()
            .filter_map(|id| self.nodes.get(id).cloned())
            .collect();
        let edges = self
            .edges
            .values()
            .filter(|edge| seen.contains(edge.source()) && seen.contains(edge.target()))
            .cloned()
            .collect();
        GraphResult::Subgraph { nodes, edges }
    }

    fn path(&self, from: &NodeId, to: &NodeId) -> GraphResult {
        let mut predecessor: HashMap<NodeId, EdgeKey> = HashMap::new();
        let mut seen = BTreeSet::from([from.clone()]);
        let mut queue = VecDeque::from([from.clone()]);

        while let Some(current) = queue.pop_front() {
            if &current == to {
                break;
            }
            for key in self.edges.keys().filter(|key| key.from == current) {
                if seen.insert(key.to.clone()) {
                    predecessor.insert(key.to.clone(), key.clone());
                    queue.push_back(key.to.clone());
                }
            }
        }

        if !seen.contains(to) {
            return GraphResult::empty();
        }

        let mut node_ids = vec![to.clone()];
        let mut edge_keys = Vec::new();
        let mut cursor = to.clone();
        while let Some(key) = predecessor.get(&cursor) {
            edge_keys.push(key.clone());
            node_ids.push(key.from.clone());
            cursor = key.from.clone();
        }
        node_ids.reverse();
        edge_keys.reverse();

        GraphResult::Subgraph {
            nodes: node_ids
                .iter()
                .filter_map(|id| self.nodes.get(id).cloned())
                .collect(),
            edges: edge_keys
                .iter()
                .filter_map(|key| self.edges.get(key).cloned())
                .collect(),
        }
    }
}

impl InMemoryGraphStore {
    /// Creates an empty graph store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored nodes and edges.
    ///
    /// # Errors
    ///
    /// Returns [`GraphStoreError::Unavailable`] when the lock is poisoned.
    pub fn counts(&self) -> GraphStoreResult<(usize, usize)> {
        let state = self.state.read().map_err(lock_error)?;
        Ok((state.nodes.len(), state.edges.len()))
    }
}

fn lock_error<E: std::fmt::Display>(err: E) -> GraphStoreError {
    GraphStoreError::unavailable(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl GraphStore for InMemoryGraphStore {
    async fn upsert_node(
        &self,
        id: NodeId,
        labels: BTreeSet<String>,
        properties: Properties,
    ) -> GraphStoreResult<GraphNode> {
        let mut state = self.state.write().map_err(lock_error)?;
        let node = GraphNode::new(id.clone(), labels, properties);
        state.nodes.insert(id, node.clone());
        Ok(node)
    }

    async fn upsert_edge(
        &self,
        from: NodeId,
        to: NodeId,
        edge_type: EdgeType,
        properties: Properties,
    ) -> GraphStoreResult<GraphEdge> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.require(&from)?;
        state.require(&to)?;
        let edge = GraphEdge::new(from, to, edge_type, properties);
        state.edges.insert(edge.key(), edge.clone());
        Ok(edge)
    }

    async fn query_neighbors(&self, id: NodeId, depth: u8) -> GraphStoreResult<GraphResult> {
        let state = self.state.read().map_err(lock_error)?;
        state.require(&id)?;
        Ok(state.neighbors(&id, depth))
    }

    async fn query_path(&self, from: NodeId, to: NodeId) -> GraphStoreResult<GraphResult> {
        let state = self.state.read().map_err(lock_error)?;
        state.require(&from)?;
        state.require(&to)?;
        Ok(state.path(&from, &to))
    }

    async fn ping(&self) -> GraphStoreResult<()> {
        self.state.read().map_err(lock_error).map(|_| ())
    }
}
