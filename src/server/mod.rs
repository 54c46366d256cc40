//! Server surfaces.
//!
//! - [`ServerContext`] owns every shared component for one server instance
//! - [`transport`] carries envelopes over WebSocket or length-prefixed TCP
//! - [`health`] exposes `GET /health`
//! - [`BoundServer`] runs the accept loop and the orderly shutdown

pub mod context;
pub mod error;
pub mod health;
pub mod runtime;
pub mod transport;

#[cfg(test)]
mod tests;

pub use context::ServerContext;
pub use error::TransportError;
pub use health::{HealthReport, RouterHealth, ServiceStatus, health_routes, served_methods};
pub use runtime::BoundServer;
pub use transport::{read_frame, write_frame};
