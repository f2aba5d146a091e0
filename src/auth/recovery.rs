//! Recovery code generation and verification.
//!
//! Recovery codes let the operator log in when the TOTP device is
//! unavailable. Plaintext codes are shown exactly once at generation time;
//! only Argon2id hashes are persisted, and each code is consumable exactly
//! once (the store marks it used with a conditional update).

use anyhow::{Context, Result};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use rand::{RngCore, rngs::OsRng};
use uuid::Uuid;

pub const RECOVERY_CODE_COUNT: usize = 10;
const RECOVERY_CODE_LEN: usize = 12;
const RECOVERY_CODE_GROUP_SIZE: usize = 4;
// Excludes 0/O/1/I to keep hand-typed codes unambiguous.
const RECOVERY_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// A freshly generated recovery-code batch (plaintext + hashes).
#[derive(Debug)]
pub struct RecoveryCodeBatch {
    pub batch_id: Uuid,
    pub codes: Vec<String>,
    pub code_hashes: Vec<String>,
}

impl RecoveryCodeBatch {
    /// Generate a new batch of [`RECOVERY_CODE_COUNT`] codes.
    ///
    /// # Errors
    /// Returns an error if code generation or hashing fails.
    pub fn generate() -> Result<Self> {
        let mut rng = OsRng;
        Self::generate_with_rng(&mut rng)
    }

    fn generate_with_rng<R: RngCore + ?Sized>(rng: &mut R) -> Result<Self> {
        let mut codes = Vec::with_capacity(RECOVERY_CODE_COUNT);
        let mut code_hashes = Vec::with_capacity(RECOVERY_CODE_COUNT);
        for _ in 0..RECOVERY_CODE_COUNT {
            let code = generate_code(rng)?;
            let hash = hash_recovery_code(&code)?;
            codes.push(code);
            code_hashes.push(hash);
        }
        Ok(Self {
            batch_id: Uuid::new_v4(),
            codes,
            code_hashes,
        })
    }
}

/// Normalize a recovery code for verification (strip separators, uppercase).
///
/// # Errors
/// Returns an error if the normalized code has the wrong length or
/// characters outside the code alphabet.
pub fn normalize_recovery_code(input: &str) -> Result<String> {
    let normalized: String = input
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|ch| ch.to_ascii_uppercase())
        .collect();

    if normalized.len() != RECOVERY_CODE_LEN {
        return Err(anyhow::anyhow!("invalid recovery code length"));
    }

    if !normalized
        .as_bytes()
        .iter()
        .all(|ch| RECOVERY_CODE_ALPHABET.contains(ch))
    {
        return Err(anyhow::anyhow!("invalid recovery code characters"));
    }

    Ok(normalized)
}

/// Format a normalized recovery code for display (`XXXX-XXXX-XXXX`).
///
/// # Errors
/// Returns an error if the input is not a normalized code.
pub fn format_recovery_code(normalized: &str) -> Result<String> {
    if normalized.len() != RECOVERY_CODE_LEN {
        return Err(anyhow::anyhow!("invalid recovery code length"));
    }
    let mut out = String::with_capacity(RECOVERY_CODE_LEN + 2);
    for (idx, chunk) in normalized
        .as_bytes()
        .chunks(RECOVERY_CODE_GROUP_SIZE)
        .enumerate()
    {
        if idx > 0 {
            out.push('-');
        }
        out.push_str(std::str::from_utf8(chunk).context("invalid recovery code chunk")?);
    }
    Ok(out)
}

/// Verify a recovery code against a single stored hash.
///
/// # Errors
/// Returns an error if the input cannot be normalized or the stored hash
/// is not a valid Argon2 hash string.
pub fn verify_recovery_code(code: &str, stored_hash: &str) -> Result<bool> {
    let normalized = normalize_recovery_code(code)?;
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|_| anyhow::anyhow!("invalid recovery code hash"))?;
    Ok(Argon2::default()
        .verify_password(normalized.as_bytes(), &parsed)
        .is_ok())
}

/// Find the stored hash a code matches, checking **every** hash.
///
/// Deliberately does not short-circuit on the first match, so the work
/// done does not reveal which stored code almost matched.
///
/// # Errors
/// Returns an error only if the input cannot be normalized; unparseable
/// stored hashes are skipped as non-matches.
pub fn find_matching_hash<'a>(code: &str, stored_hashes: &'a [String]) -> Result<Option<&'a str>> {
    // Normalize once up front so an invalid input fails before any hashing.
    let normalized = normalize_recovery_code(code)?;
    let mut matched: Option<&str> = None;
    for stored in stored_hashes {
        let ok = PasswordHash::new(stored).is_ok_and(|parsed| {
            Argon2::default()
                .verify_password(normalized.as_bytes(), &parsed)
                .is_ok()
        });
        if ok && matched.is_none() {
            matched = Some(stored.as_str());
        }
    }
    Ok(matched)
}

/// Generate a single recovery code in grouped display form.
fn generate_code<R: RngCore + ?Sized>(rng: &mut R) -> Result<String> {
    let mut raw = [0u8; RECOVERY_CODE_LEN];
    rng.fill_bytes(&mut raw);
    let mut normalized = String::with_capacity(RECOVERY_CODE_LEN);
    for byte in raw {
        let idx = usize::from(byte) % RECOVERY_CODE_ALPHABET.len();
        if let Some(&char_byte) = RECOVERY_CODE_ALPHABET.get(idx) {
            normalized.push(char_byte as char);
        }
    }
    format_recovery_code(&normalized)
}

/// Hash a recovery code with salted Argon2id.
fn hash_recovery_code(code: &str) -> Result<String> {
    let normalized = normalize_recovery_code(code)?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(normalized.as_bytes(), &salt)
        .map_err(|_| anyhow::anyhow!("failed to hash recovery code"))?
        .to_string();
    Ok(hash)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn normalize_recovery_code_strips_and_uppercases() {
        let normalized = normalize_recovery_code("abcd-efgh-jklm").unwrap();
        assert_eq!(normalized, "ABCDEFGHJKLM");
    }

    #[test]
    fn normalize_rejects_wrong_length_and_alphabet() {
        assert!(normalize_recovery_code("abcd").is_err());
        assert!(normalize_recovery_code("ABCD-EFGH-JKL0").is_err());
    }

    #[test]
    fn format_recovery_code_groups() {
        let formatted = format_recovery_code("ABCDEFGHJKLM").unwrap();
        assert_eq!(formatted, "ABCD-EFGH-JKLM");
    }

    #[test]
    fn batch_generates_ten_hashed_codes() {
        let batch = RecoveryCodeBatch::generate().unwrap();
        assert_eq!(batch.codes.len(), RECOVERY_CODE_COUNT);
        assert_eq!(batch.code_hashes.len(), RECOVERY_CODE_COUNT);
        for code in &batch.codes {
            assert_eq!(code.len(), 14); // 12 chars + 2 separators
        }
    }

    #[test]
    fn hash_and_verify_round_trip() {
        let batch = RecoveryCodeBatch::generate().unwrap();
        let code = batch.codes.first().unwrap();
        let hash = batch.code_hashes.first().unwrap();
        assert!(verify_recovery_code(code, hash).unwrap());
        assert!(!verify_recovery_code("ABCD-EFGH-9999", hash).unwrap());
    }

    #[test]
    fn find_matching_hash_checks_all_hashes() {
        let batch = RecoveryCodeBatch::generate().unwrap();
        let code = batch.codes.last().unwrap();
        let matched = find_matching_hash(code, &batch.code_hashes).unwrap();
        assert_eq!(matched, batch.code_hashes.last().map(String::as_str));
    }

    #[test]
    fn find_matching_hash_rejects_unknown_code() {
        let batch = RecoveryCodeBatch::generate().unwrap();
        let matched = find_matching_hash("ABCD-EFGH-JKLM", &batch.code_hashes).unwrap();
        assert!(matched.is_none());
    }

    #[test]
    fn find_matching_hash_rejects_malformed_input() {
        let batch = RecoveryCodeBatch::generate().unwrap();
        assert!(find_matching_hash("nope", &batch.code_hashes).is_err());
    }
}
