//! Unit tests for the server surfaces.
