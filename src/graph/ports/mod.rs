//! Port contracts for the knowledge graph store.

pub mod store;

pub use store::{GraphStore, GraphStoreError, GraphStoreResult};

#[cfg(test)]
pub use store::MockGraphStore;
