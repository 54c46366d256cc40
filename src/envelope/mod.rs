//! JSON-RPC envelope model and wire codec for agent traffic.
//!
//! Every byte that crosses an agent connection is decoded into an
//! [`domain::Envelope`] here before any routing decision is made, and every
//! outbound envelope is written back through the same codec. The codec is
//! stateless: it validates shape, never semantics, so valid-but-unknown
//! methods pass through and fail later in the router.
//!
//! - Domain types in [`domain`]
//! - Wire codec in [`codec`]

pub mod codec;
pub mod domain;

#[cfg(test)]
mod tests;
