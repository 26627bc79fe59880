//! Credential error types.

/// Errors that can occur while authenticating an upgrade request.
///
/// A missing cookie is treated identically to an invalid one at the upgrade
/// gate; both terminate the handshake without touching the registry. The
/// variants exist so logs can distinguish the two.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// No `refreshToken` cookie was present in the handshake.
    #[error("refresh token cookie missing")]
    Missing,

    /// The token was malformed, had a bad signature, or expired.
    #[error("refresh token rejected: {0}")]
    Rejected(#[from] jsonwebtoken::errors::Error),
}

impl CredentialError {
    /// Whether the failure was specifically an expired token.
    pub fn is_expired(&self) -> bool {
        matches!(
            self,
            Self::Rejected(e)
                if matches!(e.kind(), jsonwebtoken::errors::ErrorKind::ExpiredSignature)
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
