//! # Identity Verification
//!
//! Issues and verifies the opaque bearer credentials handed out at login.
//!
//! The rest of the core only sees the [`IdentityVerifier`] trait: issue a
//! credential for an email, or resolve a presented credential back to the
//! email it was issued for. The default implementation is a JWT signed with
//! a shared secret; swapping the scheme never touches the services above.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Boundary between the core and the credential scheme.
pub trait IdentityVerifier: Send + Sync {
    /// Issue a fresh credential bound to an email.
    fn issue(&self, email: &str) -> Result<String>;

    /// Verify a presented credential and return the email it was issued for.
    fn verify(&self, credential: &str) -> Result<String>;
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// Email the credential was issued for
    sub: String,
    /// Expiry (seconds since epoch)
    exp: u64,
    /// Issued-at (seconds since epoch)
    iat: u64,
}

/// JWT-backed [`IdentityVerifier`] using an HMAC shared secret.
pub struct JwtVerifier {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: u64,
}

impl JwtVerifier {
    /// Create a verifier from a shared secret and credential lifetime.
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
        }
    }
}

impl IdentityVerifier for JwtVerifier {
    fn issue(&self, email: &str) -> Result<String> {
        let now = crate::time::now_timestamp() as u64;
        let claims = Claims {
            sub: email.to_string(),
            exp: now + self.ttl_secs,
            iat: now,
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| Error::Internal(format!("Failed to sign credential: {}", e)))
    }

    fn verify(&self, credential: &str) -> Result<String> {
        let data = decode::<Claims>(credential, &self.decoding, &Validation::default())
            .map_err(|_| Error::InvalidToken)?;

        Ok(data.claims.sub)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_verify_roundtrip() {
        let verifier = JwtVerifier::new("test-secret", 3600);
        let token = verifier.issue("alice@example.com").unwrap();
        assert_eq!(verifier.verify(&token).unwrap(), "alice@example.com");
    }

    #[test]
    fn test_tampered_credential_is_rejected() {
        let verifier = JwtVerifier::new("test-secret", 3600);
        let token = verifier.issue("alice@example.com").unwrap();

        let mut tampered = token.clone();
        tampered.push('x');
        let err = verifier.verify(&tampered).unwrap_err();
        assert!(matches!(err, Error::InvalidToken));

        let err = verifier.verify("not-a-token").unwrap_err();
        assert!(matches!(err, Error::InvalidToken));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let issuer = JwtVerifier::new("secret-a", 3600);
        let other = JwtVerifier::new("secret-b", 3600);

        let token = issuer.issue("alice@example.com").unwrap();
        let err = other.verify(&token).unwrap_err();
        assert!(matches!(err, Error::InvalidToken));
    }
}
