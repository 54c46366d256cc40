//! Dispatch router: decides where every envelope goes and correlates the
//! answers.
//!
//! Requests are resolved into a [`domain::Route`], forwarded under a freshly
//! minted correlation id and tracked as a [`domain::PendingCall`] until a
//! reply, a deadline or a deregistration settles them.
//!
//! - Domain types in [`domain`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod services;

#[cfg(test)]
mod tests;
