//! HTTP health surface.

use super::ServerContext;
use crate::graph::domain::GraphOperation;
use crate::health::StoreHealth;
use crate::registry::domain::RegistryStats;
use crate::session::domain::AgentCommand;
use crate::spatial::domain::SpatialOperation;
use axum::{Json, Router, extract::State, routing::get};
use mockable::Clock;
use serde::Serialize;
use std::sync::Arc;

/// Overall server status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    /// Both stores answered their last ping.
    Healthy,
    /// At least one store is unreachable.
    Degraded,
}

/// Router counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RouterHealth {
    /// Forwarded requests awaiting a reply.
    pub pending_calls: usize,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    /// `healthy` when both stores are healthy, otherwise `degraded`.
    pub status: ServiceStatus,
    /// Agent counts.
    pub registry: RegistryStats,
    /// Router counters.
    pub router: RouterHealth,
    /// Graph store ping result.
    pub graph_store: StoreHealth,
    /// Spatial store ping result.
    pub spatial_store: StoreHealth,
    /// Every server-handled method name.
    pub methods: Vec<&'static str>,
}

/// Returns the `agent.*`, `graph.*` and `spatial.*` method names.
#[must_use]
pub fn served_methods() -> Vec<&'static str> {
    AgentCommand::METHODS
        .into_iter()
        .chain(GraphOperation::METHODS)
        .chain(SpatialOperation::METHODS)
        .collect()
}

/// Builds the `axum` router exposing `GET /health`.
#[must_use]
pub fn health_routes<C>(context: Arc<ServerContext<C>>) -> Router
where
    C: Clock + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health::<C>))
        .with_state(context)
}

async fn health<C>(State(context): State<Arc<ServerContext<C>>>) -> Json<HealthReport>
where
    C: Clock + Send + Sync + 'static,
{
    Json(context.health_report().await)
}
