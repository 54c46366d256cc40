//! Server-lifetime context owning every shared component.

use super::health::{HealthReport, RouterHealth, ServiceStatus, served_methods};
use crate::config::{AuthMode, ConfigError, ServerConfig};
use crate::envelope::codec::EnvelopeCodec;
use crate::graph::{
    adapters::InMemoryGraphStore,
    ports::GraphStore,
    services::{GraphCache, GraphGateway},
};
use crate::registry::services::AgentRegistry;
use crate::router::{
    adapters::RouterDeregistrationListener,
    services::{Router, SharedGraphGateway, SharedSpatialGateway},
};
use crate::session::{
    adapters::{AllowAllVerifier, StaticTokenVerifier},
    ports::CredentialVerifier,
    services::Supervisor,
};
use crate::spatial::{
    adapters::{InMemorySpatialStore, PostGisSpatialStore},
    ports::SpatialStore,
    services::SpatialGateway,
};
use mockable::{Clock, DefaultClock};
use std::sync::Arc;
use tokio::sync::watch;

/// Everything one server instance shares across connections.
///
/// Created once at startup and torn down by [`ServerContext::shutdown`].
/// Contexts hold no global state, so several can coexist in one process.
pub struct ServerContext<C = DefaultClock>
where
    C: Clock + Send + Sync + 'static,
{
    config: ServerConfig,
    clock: Arc<C>,
    supervisor: Arc<Supervisor<C>>,
    shutdown: watch::Sender<bool>,
}

impl ServerContext<DefaultClock> {
    /// Builds a context with the stores and verifier named by `config`.
    ///
    /// The graph store is in memory. The spatial store is `PostGIS` when
    /// `spatial.database_url` is set and in memory otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the configuration is invalid.
    pub fn from_config(config: ServerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let graph_store: Arc<dyn GraphStore> = Arc::new(InMemoryGraphStore::new());
        let spatial_store: Arc<dyn SpatialStore> = match config.spatial.database_url.as_deref() {
            Some(url) => Arc::new(PostGisSpatialStore::connect(
                url,
                config.table_name()?,
                config.spatial.table_crs,
                config.spatial.pool_size,
                config.pool_wait(),
            )),
            None => Arc::new(InMemorySpatialStore::new()),
        };
        let verifier: Arc<dyn CredentialVerifier> = match config.auth.mode {
            AuthMode::AllowAll => Arc::new(AllowAllVerifier),
            AuthMode::StaticTokens => Arc::new(StaticTokenVerifier::new(config.static_tokens()?)),
        };
        Ok(Self::assemble(
            config,
            Arc::new(DefaultClock),
            graph_store,
            spatial_store,
            verifier,
        ))
    }
}

impl<C> ServerContext<C>
where
    C: Clock + Send + Sync + 'static,
{
    /// Wires a context from explicit collaborators.
    #[must_use]
    pub fn assemble(
        config: ServerConfig,
        clock: Arc<C>,
        graph_store: Arc<dyn GraphStore>,
        spatial_store: Arc<dyn SpatialStore>,
        verifier: Arc<dyn CredentialVerifier>,
    ) -> Self {
        let retry = config.retry_policy();
        let registry = Arc::new(AgentRegistry::new(
            Arc::clone(&clock),
            config.heartbeat_interval(),
        ));

        let graph_gateway = GraphGateway::new(graph_store, retry);
        let graph: SharedGraphGateway = Arc::new(if config.graph.cache_enabled {
            graph_gateway.with_cache(GraphCache::new(config.graph.cache_capacity))
        } else {
            graph_gateway
        });
        let spatial: SharedSpatialGateway = Arc::new(SpatialGateway::new(
            spatial_store,
            retry,
            config.spatial.supported_crs.iter().copied(),
        ));

        let router = Arc::new(Router::new(
            registry,
            graph,
            spatial,
            Arc::clone(&clock),
            config.router_settings(),
        ));
        RouterDeregistrationListener::attach(&router);

        let supervisor = Arc::new(Supervisor::new(
            router,
            verifier,
            EnvelopeCodec::new(config.server.max_message_bytes),
            config.session_settings(),
            Arc::clone(&clock),
        ));
        let (shutdown, _initial) = watch::channel(false);

        Self {
            config,
            clock,
            supervisor,
            shutdown,
        }
    }

    /// Returns the effective configuration.
    #[must_use]
    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the session supervisor.
    #[must_use]
    pub const fn supervisor(&self) -> &Arc<Supervisor<C>> {
        &self.supervisor
    }

    /// Returns the router.
    #[must_use]
    pub fn router(&self) -> &Arc<Router<C>> {
        self.supervisor.router()
    }

    /// Returns the agent registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<AgentRegistry<C>> {
        self.supervisor.registry()
    }

    /// Returns a receiver that flips to `true` on shutdown.
    #[must_use]
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    /// Returns whether shutdown has started.
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Builds the health snapshot, pinging both stores.
    pub async fn health_report(&self) -> HealthReport {
        let now = self.clock.utc();
        let router = self.router();
        let (graph_store, spatial_store) =
            tokio::join!(router.graph().health(now), router.spatial().health(now));
        let status = if graph_store.is_healthy() && spatial_store.is_healthy() {
            ServiceStatus::Healthy
        } else {
            ServiceStatus::Degraded
        };
        HealthReport {
            status,
            registry: self.registry().stats(),
            router: RouterHealth {
                pending_calls: router.pending_calls(),
            },
            graph_store,
            spatial_store,
            methods: served_methods(),
        }
    }

    /// Stops background work and closes every session.
    ///
    /// Returns the number of agents deregistered. Repeated calls are
    /// harmless.
    pub fn shutdown(&self) -> usize {
        let was_stopping = self.shutdown.send_replace(true);
        if !was_stopping {
            tracing::info!("server shutting down");
        }
        self.supervisor.shutdown()
    }
}
