//! Unit tests for the spatial module.

mod adapter_tests;
