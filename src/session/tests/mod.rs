//! Unit tests for the session module.
