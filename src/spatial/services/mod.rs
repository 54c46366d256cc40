//! Application services for the spatial query gateway.

mod gateway;

pub use gateway::{SpatialGateway, SpatialGatewayError};
