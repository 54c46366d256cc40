//! In-memory integration tests for the agent fabric.
//!
//! Tests are organized into modules by functionality:
//! - `routing_tests`: request forwarding, reply correlation, notifications
//! - `gateway_tests`: graph and spatial calls routed through the server
//! - `liveness_tests`: heartbeat degradation, expiry and call deadlines

mod test_helpers;

mod in_memory {
    mod gateway_tests;
    mod liveness_tests;
    mod routing_tests;
}
