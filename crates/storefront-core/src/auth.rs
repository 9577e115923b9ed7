//! Shared-secret bearer authentication.
//!
//! Webhook senders and operators authenticate with
//! `Authorization: Bearer <secret>`. Both sides are hashed before the
//! comparison so it runs in constant time and independent of secret length.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Missing authorization header")]
    MissingHeader,
    #[error("Invalid authorization header format")]
    MalformedHeader,
    #[error("Invalid credentials")]
    InvalidSecret,
    /// No secret is configured, so no caller can be authenticated.
    #[error("Authentication is not configured")]
    NotConfigured,
}

fn hash_secret(secret: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.finalize().into()
}

/// Extracts the token from an `Authorization` header value.
pub fn parse_bearer(header: &str) -> Result<&str, AuthError> {
    header
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MalformedHeader)
}

/// Checks an `Authorization` header against the expected secret.
///
/// An unset or empty `expected` secret rejects every caller.
pub fn verify_bearer(header: Option<&str>, expected: Option<&str>) -> Result<(), AuthError> {
    let expected = expected
        .filter(|s| !s.is_empty())
        .ok_or(AuthError::NotConfigured)?;
    let token = parse_bearer(header.ok_or(AuthError::MissingHeader)?)?;

    if hash_secret(token).ct_eq(&hash_secret(expected)).unwrap_u8() == 0 {
        return Err(AuthError::InvalidSecret);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_secret() {
        assert_eq!(verify_bearer(Some("Bearer s3cret"), Some("s3cret")), Ok(()));
    }

    #[test]
    fn test_wrong_secret() {
        assert_eq!(
            verify_bearer(Some("Bearer s3cre"), Some("s3cret")),
            Err(AuthError::InvalidSecret)
        );
    }

    #[test]
    fn test_missing_and_malformed_headers() {
        assert_eq!(
            verify_bearer(None, Some("s3cret")),
            Err(AuthError::MissingHeader)
        );
        assert_eq!(
            verify_bearer(Some("Basic czNjcmV0"), Some("s3cret")),
            Err(AuthError::MalformedHeader)
        );
        assert_eq!(
            verify_bearer(Some("Bearer "), Some("s3cret")),
            Err(AuthError::MalformedHeader)
        );
    }

    #[test]
    fn test_unconfigured_secret_rejects_everyone() {
        assert_eq!(
            verify_bearer(Some("Bearer anything"), None),
            Err(AuthError::NotConfigured)
        );
        assert_eq!(
            verify_bearer(Some("Bearer "), Some("")),
            Err(AuthError::NotConfigured)
        );
    }
}
