//! Registry listener that cancels the pending calls of departed agents and
//! drops selection state for capabilities they leave vacant.

use crate::registry::{
    domain::{AgentHandle, DeregistrationReason},
    ports::DeregistrationListener,
};
use crate::router::services::Router;
use mockable::Clock;
use std::sync::{Arc, Weak};

/// Forwards deregistrations to a router without keeping it alive.
///
/// The registry owns its listeners and the router owns the registry, so
/// the listener holds a weak reference.
pub struct RouterDeregistrationListener<C>
where
    C: Clock + Send + Sync + 'static,
{
    router: Weak<Router<C>>,
}

impl<C> RouterDeregistrationListener<C>
where
    C: Clock + Send + Sync + 'static,
{
    /// Registers a listener for `router` on the router's registry.
    pub fn attach(router: &Arc<Router<C>>) {
        let listener = Arc::new(Self {
            router: Arc::downgrade(router),
        });
        router.registry().add_listener(listener);
    }
}

impl<C> DeregistrationListener for RouterDeregistrationListener<C>
where
    C: Clock + Send + Sync + 'static,
{
    fn on_deregistered(&self, agent: &AgentHandle, reason: DeregistrationReason) {
        if let Some(router) = self.router.upgrade() {
            tracing::debug!(agent_id = %agent.id(), reason = %reason, "releasing pending calls");
            router.release_agent(agent.id());
            router.prune_capabilities(agent.capabilities());
        }
    }
}
