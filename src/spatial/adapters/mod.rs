//! Spatial store adapters.

pub mod memory;
pub mod postgres;

pub use memory::InMemorySpatialStore;
pub use postgres::{PostGisSpatialStore, SpatialPgPool, TableName};
