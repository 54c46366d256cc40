//! Gateway translating graph operations into store calls.

use super::GraphCache;
use crate::envelope::domain::{ErrorCode, RpcError};
use crate::graph::{
    domain::{GraphDomainError, GraphOperation, GraphResult},
    ports::{GraphStore, GraphStoreError},
};
use crate::health::StoreHealth;
use crate::retry::RetryPolicy;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by the graph gateway.
#[derive(Debug, Clone, Error)]
pub enum GraphGatewayError {
    /// The operation could not be parsed.
    #[error(transparent)]
    Domain(#[from] GraphDomainError),

    /// The store failed or rejected the operation.
    #[error(transparent)]
    Store(#[from] GraphStoreError),
}

impl GraphGatewayError {
    /// Maps the error into the stable taxonomy.
    #[must_use]
    pub const fn to_error_code(&self) -> ErrorCode {
        match self {
            Self::Domain(GraphDomainError::UnknownOperation(_)) => ErrorCode::MethodNotFound,
            Self::Domain(_) => ErrorCode::InvalidParams,
            Self::Store(GraphStoreError::Unavailable(_)) => ErrorCode::GraphStoreUnavailable,
            Self::Store(GraphStoreError::Query(_)) => ErrorCode::GraphQueryError,
        }
    }

    /// Builds the wire error object, carrying only server-authored detail.
    #[must_use]
    pub fn to_rpc_error(&self) -> RpcError {
        let base = RpcError::from_code(self.to_error_code());
        match self {
            Self::Domain(err) => base.with_detail(err.to_string()),
            Self::Store(GraphStoreError::Query(reason)) => base.with_detail(reason.clone()),
            Self::Store(GraphStoreError::Unavailable(_)) => base,
        }
    }
}

/// Knowledge graph gateway over a [`GraphStore`].
pub struct GraphGateway<S>
where
    S: GraphStore + ?Sized,
{
    store: Arc<S>,
    retry: RetryPolicy,
    cache: Option<GraphCache>,
}

impl<S> GraphGateway<S>
where
    S: GraphStore + ?Sized,
{
    /// Creates a gateway without a cache.
    #[must_use]
    pub const fn new(store: Arc<S>, retry: RetryPolicy) -> Self {
        Self {
            store,
            retry,
            cache: None,
        }
    }

    /// Enables the neighborhood cache.
    #[must_use]
    pub fn with_cache(mut self, cache: GraphCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Returns the cache, when enabled.
    #[must_use]
    pub const fn cache(&self) -> Option<&GraphCache> {
        self.cache.as_ref()
    }

    /// Parses and executes a `graph.*` call.
    ///
    /// # Errors
    ///
    /// Returns [`GraphGatewayError`] when parsing fails or the store fails
    /// after retries.
    pub async fn execute_method(
        &self,
        method: &str,
        params: Option<&Value>,
    ) -> Result<GraphResult, GraphGatewayError> {
        let operation = GraphOperation::parse(method, params)?;
        self.execute(operation).await
    }

    /// Executes a parsed operation.
    ///
    /// # Errors
    ///
    /// Returns [`GraphGatewayError::Store`] when the store rejects the call
    /// or stays unavailable after the retry budget.
    pub async fn execute(&self, operation: GraphOperation) -> Result<GraphResult, GraphGatewayError> {
        let cacheable = matches!(operation, GraphOperation::QueryNeighbors { .. });
        let lookup = match (&self.cache, cacheable) {
            (Some(cache), true) => {
                let signature = GraphCache::signature(&operation);
                if let Some(hit) = cache.get(&signature).await {
                    tracing::debug!(method = operation.method(), "graph cache hit");
                    return Ok(hit);
                }
                Some((cache, signature, cache.generation()))
            }
            _ => None,
        };

        let result = self
            .retry
            .run(operation.method(), || self.call_store(&operation))
            .await?;

        if let Some(cache) = &self.cache
            && operation.is_mutation()
        {
            cache.invalidate(&operation.touched_nodes());
        }
        if let Some((cache, signature, generation)) = lookup {
            cache.insert(signature, result.clone(), generation).await;
        }
        Ok(result)
    }

    /// Pings the store and reports its health at `now`.
    pub async fn health(&self, now: DateTime<Utc>) -> StoreHealth {
        match self.store.ping().await {
            Ok(()) => StoreHealth::healthy(now),
            Err(err) => {
                tracing::warn!(error = %err, "graph store ping failed");
                StoreHealth::unhealthy(now, "graph store unreachable")
            }
        }
    }

    async fn call_store(&self, operation: &GraphOperation) -> Result<GraphResult, GraphStoreError> {
        match operation.clone() {
            GraphOperation::UpsertNode {
                id,
                labels,
                properties,
            } => self
                .store
                .upsert_node(id, labels, properties)
                .await
                .map(GraphResult::Node),
            GraphOperation::UpsertEdge {
                from,
                to,
                edge_type,
                properties,
            } => self
                .store
                .upsert_edge(from, to, edge_type, properties)
                .await
                .map(GraphResult::Edge),
            GraphOperation::QueryNeighbors { id, depth } => {
                self.store.query_neighbors(id, depth).await
            }
            GraphOperation::QueryPath { from, to } => self.store.query_path(from, to).await,
        }
    }
}
