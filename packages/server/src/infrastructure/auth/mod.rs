//! Credential verifier implementations.

pub mod jwt;

pub use jwt::{Claims, JwtCredentialVerifier, issue_token};
