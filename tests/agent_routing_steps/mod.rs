//! Step definitions for agent routing scenarios.

mod given;
mod then;
mod when;
pub mod world;
