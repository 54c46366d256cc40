//! Spatial query gateway.
//!
//! Validates `spatial.*` envelopes, enforces the configured set of
//! coordinate reference systems and runs the query against a
//! [`ports::SpatialStore`]. Two adapters ship with the crate: an in-memory
//! point store and a `PostGIS` store on a pooled diesel connection.
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
