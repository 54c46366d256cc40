//! Spatial store port consumed by the gateway.

use crate::retry::Retryable;
use crate::spatial::domain::{Crs, Point, Polygon, SpatialQueryResult};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for spatial store operations.
pub type SpatialStoreResult<T> = Result<T, SpatialStoreError>;

/// Geometry/attribute query contract.
///
/// Implementations answer in the CRS they are given and never substitute
/// another one.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpatialStore: Send + Sync {
    /// Returns whether the store can answer queries in `crs` without
    /// reprojecting.
    fn serves(&self, crs: Crs) -> bool;

    /// Returns the rows inside `polygon`.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialStoreError::Unavailable`] when the store cannot be
    /// reached.
    async fn query_region(&self, polygon: Polygon, crs: Crs) -> SpatialStoreResult<SpatialQueryResult>;

    /// Returns the `k` rows closest to `point`, nearest first.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialStoreError::Unavailable`] when the store cannot be
    /// reached.
    async fn nearest_to(
        &self,
        point: Point,
        crs: Crs,
        k: u16,
    ) -> SpatialStoreResult<SpatialQueryResult>;

    /// Returns the rows within `radius` of `point`, nearest first.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialStoreError::Unavailable`] when the store cannot be
    /// reached.
    async fn within_distance(
        &self,
        point: Point,
        crs: Crs,
        radius: f64,
    ) -> SpatialStoreResult<SpatialQueryResult>;

    /// Checks that the store is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialStoreError::Unavailable`] when the store cannot be
    /// reached.
    async fn ping(&self) -> SpatialStoreResult<()>;
}

/// Errors returned by spatial store implementations.
#[derive(Debug, Clone, Error)]
pub enum SpatialStoreError {
    /// The store could not be reached or no pooled connection was free.
    #[error("spatial store unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),

    /// The store rejected the query.
    #[error("spatial query failed: {0}")]
    Query(String),
}

impl SpatialStoreError {
    /// Wraps a connectivity error.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }

    /// Creates a query rejection with a server-authored reason.
    pub fn query(reason: impl Into<String>) -> Self {
        Self::Query(reason.into())
    }
}

impl Retryable for SpatialStoreError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}
