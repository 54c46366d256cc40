//! Port contracts for handshake credential checks.

pub mod credentials;

pub use credentials::{CredentialError, CredentialVerifier};
