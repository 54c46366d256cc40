//! Adapters connecting the router to registry events.

pub mod listener;

pub use listener::RouterDeregistrationListener;
