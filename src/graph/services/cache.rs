//! Read-through cache for neighborhood queries.
//!
//! Entries have no time-to-live. Each entry remembers the node ids of the
//! neighborhood it covers, and a mutation touching any of those ids evicts
//! it. A generation counter keeps a query that raced a mutation from
//! caching its stale answer.

use crate::graph::domain::{GraphOperation, GraphResult, NodeId};
use moka::future::Cache;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// SHA-256 of an operation name and its canonical parameters.
pub type QuerySignature = [u8; 32];

#[derive(Debug)]
struct CachedGraph {
    result: GraphResult,
    neighborhood: BTreeSet<NodeId>,
}

/// Capacity-bounded cache of graph query results.
#[derive(Debug, Clone)]
pub struct GraphCache {
    inner: Cache<QuerySignature, Arc<CachedGraph>>,
    generation: Arc<AtomicU64>,
}

impl GraphCache {
    /// Creates a cache holding at most `max_capacity` results.
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .support_invalidation_closures()
                .build(),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Computes the cache key of an operation.
    #[must_use]
    pub fn signature(operation: &GraphOperation) -> QuerySignature {
        let mut hasher = Sha256::new();
        hasher.update(operation.method().as_bytes());
        hasher.update([0_u8]);
        hasher.update(operation.canonical_params().to_string().as_bytes());
        hasher.finalize().into()
    }

    /// Returns the current invalidation generation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Returns a cached result.
    pub async fn get(&self, signature: &QuerySignature) -> Option<GraphResult> {
        self.inner
            .get(signature)
            .await
            .map(|entry| entry.result.clone())
    }

    /// Caches a result unless an invalidation happened since `generation`.
    pub async fn insert(&self, signature: QuerySignature, result: GraphResult, generation: u64) {
        if self.generation() != generation {
            tracing::debug!("skipping cache fill raced by a graph mutation");
            return;
        }
        let neighborhood = result.node_ids();
        self.inner
            .insert(
                signature,
                Arc::new(CachedGraph {
                    result,
                    neighborhood,
                }),
            )
            .await;
    }

    /// Evicts every entry whose neighborhood contains one of `nodes`.
    pub fn invalidate(&self, nodes: &[NodeId]) {
        if nodes.is_empty() {
            return;
        }
        self.generation.fetch_add(1, Ordering::AcqRel);
        let touched: BTreeSet<NodeId> = nodes.iter().cloned().collect();
        let predicate = move |_: &QuerySignature, entry: &Arc<CachedGraph>| {
            !entry.neighborhood.is_disjoint(&touched)
        };
        if let Err(err) = self.inner.invalidate_entries_if(predicate) {
            tracing::warn!(error = %err, "graph cache invalidation failed, clearing cache");
            self.inner.invalidate_all();
        }
    }

    /// Returns the approximate number of cached entries.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}
