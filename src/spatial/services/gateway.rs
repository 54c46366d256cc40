//! Gateway translating spatial operations into store calls.

use crate::envelope::domain::{ErrorCode, RpcError};
use crate::health::StoreHealth;
use crate::retry::RetryPolicy;
use crate::spatial::{
    domain::{Crs, SpatialDomainError, SpatialOperation, SpatialQueryResult},
    ports::{SpatialStore, SpatialStoreError},
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by the spatial gateway.
#[derive(Debug, Clone, Error)]
pub enum SpatialGatewayError {
    /// The operation could not be parsed.
    #[error(transparent)]
    Domain(#[from] SpatialDomainError),

    /// The CRS is well formed but not served.
    #[error("unsupported crs: {0}")]
    UnsupportedCrs(Crs),

    /// The store failed or rejected the query.
    #[error(transparent)]
    Store(#[from] SpatialStoreError),
}

impl SpatialGatewayError {
    /// Maps the error into the stable taxonomy.
    #[must_use]
    pub const fn to_error_code(&self) -> ErrorCode {
        match self {
            Self::Domain(SpatialDomainError::UnknownOperation(_)) => ErrorCode::MethodNotFound,
            Self::Domain(SpatialDomainError::UnsupportedCrs(_)) | Self::UnsupportedCrs(_) => {
                ErrorCode::UnsupportedCrs
            }
            Self::Domain(_) => ErrorCode::InvalidParams,
            Self::Store(SpatialStoreError::Unavailable(_)) => ErrorCode::SpatialStoreUnavailable,
            Self::Store(SpatialStoreError::Query(_)) => ErrorCode::SpatialQueryError,
        }
    }

    /// Builds the wire error object, carrying only server-authored detail.
    #[must_use]
    pub fn to_rpc_error(&self) -> RpcError {
        let base = RpcError::from_code(self.to_error_code());
        match self {
            Self::Domain(err) => base.with_detail(err.to_string()),
            Self::UnsupportedCrs(crs) => base.with_detail(format!("{crs} is not served")),
            Self::Store(SpatialStoreError::Query(reason)) => base.with_detail(reason.clone()),
            Self::Store(SpatialStoreError::Unavailable(_)) => base,
        }
    }
}

/// Spatial gateway over a [`SpatialStore`].
pub struct SpatialGateway<S>
where
    S: SpatialStore + ?Sized,
{
    store: Arc<S>,
    retry: RetryPolicy,
    supported_crs: BTreeSet<Crs>,
}

impl<S> SpatialGateway<S>
where
    S: SpatialStore + ?Sized,
{
    /// Creates a gateway serving the given CRS set.
    #[must_use]
    pub fn new(
        store: Arc<S>,
        retry: RetryPolicy,
        supported_crs: impl IntoIterator<Item = Crs>,
    ) -> Self {
        Self {
            store,
            retry,
            supported_crs: supported_crs.into_iter().collect(),
        }
    }

    /// Returns the served CRS set.
    #[must_use]
    pub const fn supported_crs(&self) -> &BTreeSet<Crs> {
        &self.supported_crs
    }

    /// Parses and executes a `spatial.*` call.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialGatewayError`] when parsing fails, the CRS is not
    /// served or the store fails after retries.
    pub async fn execute_method(
        &self,
        method: &str,
        params: Option<&Value>,
    ) -> Result<SpatialQueryResult, SpatialGatewayError> {
        let operation = SpatialOperation::parse(method, params)?;
        self.execute(operation).await
    }

    /// Executes a parsed operation.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialGatewayError::UnsupportedCrs`] before querying when
    /// the CRS is not configured or the store does not hold data in it.
    pub async fn execute(
        &self,
        operation: SpatialOperation,
    ) -> Result<SpatialQueryResult, SpatialGatewayError> {
        let crs = operation.crs();
        if !self.supported_crs.contains(&crs) || !self.store.serves(crs) {
            return Err(SpatialGatewayError::UnsupportedCrs(crs));
        }
        let result = self
            .retry
            .run(operation.method(), || self.call_store(&operation))
            .await?;
        Ok(result)
    }

    /// Pings the store and reports its health at `now`.
    pub async fn health(&self, now: DateTime<Utc>) -> StoreHealth {
        match self.store.ping().await {
            Ok(()) => StoreHealth::healthy(now),
            Err(err) => {
                tracing::warn!(error = %err, "spatial store ping failed");
                StoreHealth::unhealthy(now, "spatial store unreachable")
            }
        }
    }

    async fn call_store(
        &self,
        operation: &SpatialOperation,
    ) -> Result<SpatialQueryResult, SpatialStoreError> {
        match operation.clone() {
            SpatialOperation::QueryRegion { polygon, crs } => {
                self.store.query_region(polygon, crs).await
            }
            SpatialOperation::NearestTo { point, crs, k } => {
                self.store.nearest_to(point, crs, k).await
            }
            SpatialOperation::WithinDistance { point, crs, radius } => {
                self.store.within_distance(point, crs, radius).await
            }
        }
    }
}
