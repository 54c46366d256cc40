//! Domain model for spatial queries.
//!
//! Coordinates are `[x, y]` pairs; for geographic systems that is
//! `[longitude, latitude]`.

mod crs;
mod error;
mod geometry;
mod operation;
mod row;

pub use crs::Crs;
pub use error::SpatialDomainError;
pub use geometry::{Point, Polygon};
pub use operation::{MAX_NEAREST_K, SpatialOperation};
pub use row::{SpatialFeature, SpatialQueryResult, SpatialRow};
