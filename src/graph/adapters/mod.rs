//! Graph store adapters.

pub mod memory;

pub use memory::InMemoryGraphStore;
