//! Knowledge graph gateway.
//!
//! Translates `graph.*` envelopes into calls on the [`ports::GraphStore`]
//! port and normalizes the answers into [`domain::GraphResult`] values.
//! Transient store outages are retried with the shared
//! [`crate::retry::RetryPolicy`], and neighborhood reads can be served from
//! an invalidation-driven cache.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
