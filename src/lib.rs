//! Agora: an agent-to-agent (A2A) protocol server.
//!
//! Independent agents connect over a persistent bidirectional transport,
//! register the capabilities they serve and exchange JSON-RPC 2.0 shaped
//! envelopes. The server routes requests between agents by explicit target
//! or by capability, correlates replies, enforces call deadlines and agent
//! liveness, and answers `graph.*` and `spatial.*` calls itself through
//! store gateways.
//!
//! # Architecture
//!
//! Each feature module follows hexagonal architecture principles:
//!
//! - **Domain**: Pure types and rules with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (stores, connections)
//! - **Services**: Orchestration over domain types and ports
//!
//! # Modules
//!
//! - [`envelope`]: Wire envelope, identifiers, error taxonomy and codec
//! - [`registry`]: Connected agents, capabilities and liveness
//! - [`router`]: Request forwarding, correlation and deadlines
//! - [`graph`]: Knowledge graph gateway
//! - [`spatial`]: Spatial query gateway
//! - [`session`]: Per-connection sessions and the failure supervisor
//! - [`server`]: Process context, transports and the health endpoint
//! - [`config`]: TOML configuration with environment overrides

pub mod config;
pub mod envelope;
pub mod graph;
pub mod health;
pub mod registry;
pub mod retry;
pub mod router;
pub mod server;
pub mod session;
pub mod spatial;
pub mod telemetry;
