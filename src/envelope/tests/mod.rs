//! Unit tests for the envelope module.

mod domain_tests;
