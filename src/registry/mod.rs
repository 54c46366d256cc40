//! Agent registry: who is connected, what they serve, and whether they are
//! still alive.
//!
//! The registry owns every agent record. Other components refer to agents by
//! [`crate::envelope::domain::AgentId`] or hold a cheap
//! [`domain::AgentHandle`] snapshot. The module follows hexagonal
//! architecture:
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
