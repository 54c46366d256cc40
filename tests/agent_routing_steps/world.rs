//! Shared world state for agent routing BDD scenarios.

use crate::test_helpers::{Harness, TestAgent};
use agora::config::ServerConfig;
use agora::envelope::domain::CorrelationId;
use agora::session::services::SessionStep;
use rstest::fixture;
use std::collections::BTreeMap;

/// Scenario world for agent routing behaviour tests.
pub struct RoutingWorld {
    /// Server context and clock under test.
    pub harness: Harness,
    /// Registered agents by name.
    pub agents: BTreeMap<String, TestAgent>,
    /// Connection whose handshake was attempted last.
    pub challenger: Option<TestAgent>,
    /// Step returned by the last handshake attempt.
    pub handshake_step: Option<SessionStep>,
    /// Originator and id of the last request sent.
    pub last_request: Option<(String, i64)>,
    /// Id the router gave the last forwarded request.
    pub forwarded_id: Option<CorrelationId>,
}

impl RoutingWorld {
    /// Creates a world over a default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ServerConfig::default())
    }

    /// Creates a world over `config`.
    #[must_use]
    pub fn with_config(config: ServerConfig) -> Self {
        Self {
            harness: Harness::with_config(config),
            agents: BTreeMap::new(),
            challenger: None,
            handshake_step: None,
            last_request: None,
            forwarded_id: None,
        }
    }

    /// Returns a registered agent by name.
    ///
    /// # Errors
    ///
    /// Returns an error when no agent with that name was connected.
    pub fn agent(&mut self, name: &str) -> Result<&mut TestAgent, eyre::Report> {
        self.agents
            .get_mut(name)
            .ok_or_else(|| eyre::eyre!("agent '{name}' is not part of the scenario"))
    }
}

impl Default for RoutingWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> RoutingWorld {
    RoutingWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
