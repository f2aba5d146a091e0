//! Stateless admin session tokens.
//!
//! A session is a signed claim set carried in an `HttpOnly` cookie; there
//! is no server-side store, so validity is entirely signature + expiry.
//! The flip side is that a session cannot be revoked before it expires.

use anyhow::{Context, Result};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

/// The only role this service issues.
pub const ADMIN_ROLE: &str = "admin";

/// Claims embedded in the session token.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AdminSessionClaims {
    pub role: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

/// A freshly issued token plus its expiry for the cookie/response.
#[derive(Clone, Debug)]
pub struct IssuedSession {
    pub token: String,
    pub claims: AdminSessionClaims,
}

/// Signs and validates admin session tokens with a fixed TTL.
#[derive(Clone)]
pub struct SessionIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_seconds: i64,
}

impl SessionIssuer {
    #[must_use]
    pub fn new(secret: &[u8], ttl_seconds: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl_seconds,
        }
    }

    #[must_use]
    pub const fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    /// Issue a session starting now.
    ///
    /// # Errors
    /// Returns an error if signing fails or the clock is unreadable.
    pub fn issue(&self) -> Result<IssuedSession> {
        self.issue_at(now_unix_seconds()?)
    }

    /// Issue a session with an explicit start time (used by tests to
    /// produce already-expired tokens).
    ///
    /// # Errors
    /// Returns an error if signing fails.
    pub fn issue_at(&self, issued_at: i64) -> Result<IssuedSession> {
        let claims = AdminSessionClaims {
            role: ADMIN_ROLE.to_string(),
            iat: issued_at,
            exp: issued_at.saturating_add(self.ttl_seconds),
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .context("failed to sign session token")?;
        Ok(IssuedSession { token, claims })
    }

    /// Validate a presented token.
    ///
    /// Expired, tampered, or wrong-role tokens all return `None`; callers
    /// treat that exactly like "no token" for the access decision, keeping
    /// any distinction for audit metadata only.
    #[must_use]
    pub fn verify(&self, token: &str) -> Option<AdminSessionClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        // No grace period: the cookie max-age and the claim expiry agree.
        validation.leeway = 0;
        validation.validate_exp = true;

        let data = decode::<AdminSessionClaims>(token, &self.decoding_key, &validation).ok()?;
        if data.claims.role == ADMIN_ROLE {
            Some(data.claims)
        } else {
            None
        }
    }
}

/// Unix seconds for claim timestamps.
///
/// # Errors
/// Returns an error if the system clock reads before the epoch.
pub fn now_unix_seconds() -> Result<i64> {
    let elapsed = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .context("system clock before Unix epoch")?;
    i64::try_from(elapsed.as_secs()).context("system clock out of range")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-session-secret-with-enough-entropy";

    #[test]
    fn issued_token_verifies_immediately() {
        let issuer = SessionIssuer::new(SECRET, 3600);
        let session = issuer.issue().unwrap();
        let claims = issuer.verify(&session.token).unwrap();
        assert_eq!(claims.role, ADMIN_ROLE);
        assert_eq!(claims.exp - claims.iat, 3600);
        assert_eq!(claims.jti, session.claims.jti);
    }

    #[test]
    fn expired_token_fails_verification() {
        let issuer = SessionIssuer::new(SECRET, 60);
        let past = now_unix_seconds().unwrap() - 120;
        let session = issuer.issue_at(past).unwrap();
        assert!(issuer.verify(&session.token).is_none());
    }

    #[test]
    fn tampered_token_fails_verification() {
        let issuer = SessionIssuer::new(SECRET, 3600);
        let session = issuer.issue().unwrap();
        let mut tampered = session.token.clone();
        let flipped = if tampered.pop() == Some('A') { 'B' } else { 'A' };
        tampered.push(flipped);
        assert!(issuer.verify(&tampered).is_none());
    }

    #[test]
    fn token_signed_with_other_secret_fails() {
        let issuer = SessionIssuer::new(SECRET, 3600);
        let other = SessionIssuer::new(b"a-different-secret-entirely", 3600);
        let session = other.issue().unwrap();
        assert!(issuer.verify(&session.token).is_none());
    }

    #[test]
    fn garbage_token_fails_verification() {
        let issuer = SessionIssuer::new(SECRET, 3600);
        assert!(issuer.verify("not.a.jwt").is_none());
        assert!(issuer.verify("").is_none());
    }
}
