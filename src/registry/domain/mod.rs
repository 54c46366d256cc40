//! Domain model for agent registration and liveness.
//!
//! Records capability declarations, lifecycle status and heartbeat
//! timestamps for connected agents. Connection handling stays behind the
//! [`crate::registry::ports::AgentConnection`] port.

mod capability;
mod error;
mod handle;
mod liveness;
mod status;

pub use capability::{Capability, RESERVED_NAMESPACES};
pub use error::{ParseAgentStatusError, RegistryDomainError};
pub use handle::AgentHandle;
pub use liveness::{DeregistrationReason, LivenessReport, RegistryStats};
pub use status::AgentStatus;
