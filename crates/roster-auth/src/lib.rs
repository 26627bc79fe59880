//! # roster-auth
//!
//! Verification of the signed refresh credential presented during the
//! WebSocket upgrade handshake. The credential is the same `refreshToken`
//! the REST session-refresh endpoints issue; its `user` claim carries the
//! authenticated identity displayed in presence lists.

#![deny(unsafe_code)]

pub mod errors;
pub mod verifier;

pub use errors::CredentialError;
pub use verifier::{RefreshClaims, TokenVerifier};

/// Name of the cookie carrying the refresh credential.
pub const REFRESH_COOKIE: &str = "refreshToken";
