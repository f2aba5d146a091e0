//! Password hashing, verification, and the set-time strength policy.

use anyhow::{Context, Result};

/// bcrypt work factor for admin password hashes.
const BCRYPT_COST: u32 = 12;

/// Minimum password length accepted at set time.
const MIN_PASSWORD_LEN: usize = 12;

/// Character classes required at set time (of lower/upper/digit/symbol).
const MIN_CHARACTER_CLASSES: usize = 3;

/// Strength grade for operator feedback. Never blocks login; only
/// evaluated when a new password is being set.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PasswordStrength {
    Weak,
    Medium,
    Strong,
}

impl PasswordStrength {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Weak => "weak",
            Self::Medium => "medium",
            Self::Strong => "strong",
        }
    }
}

/// Why a candidate password was rejected by the policy.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PolicyViolation {
    TooShort,
    LowDiversity,
}

impl PolicyViolation {
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::TooShort => "password must be at least 12 characters",
            Self::LowDiversity => {
                "password must mix at least three of: lowercase, uppercase, digits, symbols"
            }
        }
    }
}

/// Hash a password with the fixed bcrypt work factor.
///
/// # Errors
/// Returns an error if bcrypt fails (e.g. the password contains a NUL byte).
pub fn hash(password: &str) -> Result<String> {
    bcrypt::hash(password, BCRYPT_COST).context("failed to hash password")
}

/// Verify a password against a stored bcrypt hash.
///
/// Any bcrypt error (malformed hash, unsupported version) is treated as
/// "no match" so callers never leak error detail to the client.
#[must_use]
pub fn verify(password: &str, stored_hash: &str) -> bool {
    bcrypt::verify(password, stored_hash).unwrap_or(false)
}

/// A stored hash is usable if it parses as a bcrypt hash. Used by the
/// health check to catch a mispasted `ADMIN_PASSWORD_HASH` early.
#[must_use]
pub fn is_bcrypt_hash(stored_hash: &str) -> bool {
    stored_hash.parse::<bcrypt::HashParts>().is_ok()
}

/// Apply the set-time policy and grade the remaining passwords.
///
/// # Errors
/// Returns the first [`PolicyViolation`] hit: too short, or fewer than
/// three character classes.
pub fn evaluate(password: &str) -> Result<PasswordStrength, PolicyViolation> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(PolicyViolation::TooShort);
    }
    let classes = character_classes(password);
    if classes < MIN_CHARACTER_CLASSES {
        return Err(PolicyViolation::LowDiversity);
    }

    let length = password.chars().count();
    let strength = if length >= 16 && classes == 4 {
        PasswordStrength::Strong
    } else if length >= 14 || classes == 4 {
        PasswordStrength::Medium
    } else {
        PasswordStrength::Weak
    };
    Ok(strength)
}

fn character_classes(password: &str) -> usize {
    let mut lower = false;
    let mut upper = false;
    let mut digit = false;
    let mut symbol = false;
    for ch in password.chars() {
        if ch.is_lowercase() {
            lower = true;
        } else if ch.is_uppercase() {
            upper = true;
        } else if ch.is_ascii_digit() {
            digit = true;
        } else {
            symbol = true;
        }
    }
    usize::from(lower) + usize::from(upper) + usize::from(digit) + usize::from(symbol)
}
