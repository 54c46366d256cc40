//! Unit tests for the graph module.

mod domain_tests;
