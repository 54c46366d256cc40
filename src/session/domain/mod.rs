//! Domain model for sessions.

mod close;
mod command;
mod error;
mod state;

pub use close::CloseReason;
pub use command::AgentCommand;
pub use error::{InvalidSessionTransition, SessionDomainError};
pub use state::SessionState;
