//! Credential verifier adapters.

pub mod allow_all;
pub mod static_tokens;

pub use allow_all::AllowAllVerifier;
pub use static_tokens::StaticTokenVerifier;
