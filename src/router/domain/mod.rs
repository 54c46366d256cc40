//! Domain model for dispatch.

mod error;
mod pending;
mod policy;
mod route;

pub use error::ParseSelectionPolicyError;
pub use pending::{CallTarget, PendingCall};
pub use policy::SelectionPolicy;
pub use route::Route;
