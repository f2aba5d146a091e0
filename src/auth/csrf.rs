//! Double-submit CSRF tokens.
//!
//! A request is legitimate only when the token submitted in the
//! `x-csrf-token` header byte-equals the one in the `csrf_token` cookie.
//! A cross-site attacker can make the browser send the cookie but cannot
//! read it to echo the value back.

use rand::{RngCore, rngs::OsRng};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Fixed token length: 32 raw bytes rendered as 64 hex characters.
pub const TOKEN_HEX_LEN: usize = 64;

/// Generate a new CSRF token keyed by the configured secret.
///
/// The secret makes tokens non-guessable even if the process RNG state
/// were ever predictable; verification never needs it.
#[must_use]
pub fn generate(secret: &[u8]) -> String {
    let mut nonce = [0u8; 32];
    OsRng.fill_bytes(&mut nonce);
    let mut hasher = Sha256::new();
    hasher.update(secret);
    hasher.update(nonce);
    hex::encode(hasher.finalize())
}

/// Verify the double-submit pair.
///
/// Both values must be exactly 64 hex characters and byte-equal under a
/// constant-time comparison; any mismatch, malformation, or missing value
/// fails.
#[must_use]
pub fn verify(header_token: &str, cookie_token: &str) -> bool {
    if !well_formed(header_token) || !well_formed(cookie_token) {
        return false;
    }
    header_token
        .as_bytes()
        .ct_eq(cookie_token.as_bytes())
        .into()
}

fn well_formed(token: &str) -> bool {
    token.len() == TOKEN_HEX_LEN && token.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_token_is_64_hex_chars() {
        let token = generate(b"csrf-secret");
        assert_eq!(token.len(), TOKEN_HEX_LEN);
        assert!(token.bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn generated_tokens_are_unique() {
        assert_ne!(generate(b"csrf-secret"), generate(b"csrf-secret"));
    }

    #[test]
    fn matching_pair_verifies() {
        let token = generate(b"csrf-secret");
        assert!(verify(&token, &token));
    }

    #[test]
    fn mismatched_pair_fails() {
        let a = generate(b"csrf-secret");
        let b = generate(b"csrf-secret");
        assert!(!verify(&a, &b));
    }

    #[test]
    fn malformed_tokens_fail() {
        let token = generate(b"csrf-secret");
        assert!(!verify("", &token));
        assert!(!verify(&token, ""));
        assert!(!verify(&token[..32], &token[..32]));
        let not_hex = "z".repeat(TOKEN_HEX_LEN);
        assert!(!verify(&not_hex, &not_hex));
    }
}
