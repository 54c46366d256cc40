//! `PostGIS` adapter for spatial queries.

mod models;
mod repository;
mod table;

pub use repository::{PostGisSpatialStore, SpatialPgPool};
pub use table::{InvalidTableName, TableName};
