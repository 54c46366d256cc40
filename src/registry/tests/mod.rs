//! Unit tests for the registry module.

mod service_tests;
