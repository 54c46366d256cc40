//! Per-connection sessions and the shared failure supervisor.
//!
//! A session walks `connecting → active ⇄ degraded → closed`. It handles the
//! `agent.*` methods itself, stamps every other envelope with the session's
//! agent id and hands it to the router. The supervisor owns the background
//! sweep that enforces heartbeats and call deadlines.
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
