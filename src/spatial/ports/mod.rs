//! Port contracts for the spatial store.

pub mod store;

pub use store::{SpatialStore, SpatialStoreError, SpatialStoreResult};

#[cfg(test)]
pub use store::MockSpatialStore;
