//! Application services for sessions and supervision.

mod session;
mod supervisor;
mod worker;

pub use session::{Session, SessionError, SessionStep};
pub use supervisor::{SessionSettings, Supervisor, SweepReport};
pub use worker::drive_connection;
