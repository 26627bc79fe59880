//! HS256 refresh-token verification.

use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use roster_core::Identity;

use crate::errors::CredentialError;

/// Claims embedded in a refresh token.
///
/// The accounts service signs the whole public profile into the token under
/// the `user` claim, so presence never needs a database round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// The authenticated user's public profile.
    pub user: Identity,
    /// Expiry, seconds since the Unix epoch.
    pub exp: u64,
    /// Issued-at, seconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
}

/// Validates refresh credentials against the shared signing secret.
///
/// The secret is injected at construction (never read from the environment
/// here) so the verifier can be tested with fixture keys. Verification is
/// synchronous and has no side effects.
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Create a verifier for the given HMAC secret.
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Verify a credential string and return the identity it carries.
    ///
    /// Fails with [`CredentialError::Rejected`] if the token is malformed,
    /// carries a bad signature, or has expired. Error values never contain
    /// secret material.
    pub fn verify(&self, token: &str) -> Result<Identity, CredentialError> {
        let data = jsonwebtoken::decode::<RefreshClaims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims.user)
    }
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the decoding key.
        f.debug_struct("TokenVerifier").finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
