//! Application services for dispatch.

mod pending_table;
mod router;
mod selector;

pub use pending_table::{PendingInsertError, PendingTable};
pub use router::{
    Dispatch, Router, RouterError, RouterSettings, SharedGraphGateway, SharedSpatialGateway,
};
pub use selector::HolderSelector;
