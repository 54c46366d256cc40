//! Port contracts for agent connections and deregistration observers.

pub mod connection;
pub mod listener;

pub use connection::{AgentConnection, ConnectionError};
pub use listener::DeregistrationListener;
