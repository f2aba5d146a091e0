//! TOTP engine for the second login factor.
//!
//! A single shared secret is read from server configuration; its presence
//! is the "2FA enabled" flag. There is no per-admin secret rotation, a
//! deliberate scope limit of the single-operator model.

use anyhow::{Result, anyhow};
use totp_rs::{Algorithm, Secret, TOTP};

/// Issuer shown in authenticator apps via the otpauth URL.
const OTP_ISSUER: &str = "Zodia";

/// Verifier/generator for 6-digit, 30-second TOTP codes.
///
/// Clock drift of one time-step in either direction is tolerated; that is
/// delegated to the TOTP algorithm's built-in skew window rather than
/// custom logic.
#[derive(Clone)]
pub struct TotpEngine {
    totp: TOTP,
}

impl TotpEngine {
    /// Build an engine from a base32 secret (the `ADMIN_2FA_SECRET` value).
    ///
    /// # Errors
    /// Returns an error if the secret is not valid base32 or too short for
    /// the algorithm.
    pub fn from_base32(secret_base32: &str, account: &str) -> Result<Self> {
        let secret_bytes = Secret::Encoded(secret_base32.trim().to_string())
            .to_bytes()
            .map_err(|e| anyhow!("invalid base32 TOTP secret: {e:?}"))?;
        let totp = TOTP::new(
            Algorithm::SHA1,
            6,
            1,
            30,
            secret_bytes,
            Some(OTP_ISSUER.to_string()),
            account.to_string(),
        )
        .map_err(|e| anyhow!("failed to initialize TOTP: {e}"))?;
        Ok(Self { totp })
    }

    /// Generate a fresh base32 secret for operator enrollment.
    #[must_use]
    pub fn generate_secret_base32() -> String {
        match Secret::generate_secret().to_encoded() {
            Secret::Encoded(value) => value,
            // to_encoded always yields the Encoded variant.
            Secret::Raw(_) => String::new(),
        }
    }

    /// Check a code against the current time window (±1 step skew).
    /// Clock errors are treated as "no match".
    #[must_use]
    pub fn verify(&self, code: &str) -> bool {
        self.totp.check_current(code.trim()).unwrap_or(false)
    }

    /// Check a code at an explicit Unix timestamp. Same skew window.
    #[must_use]
    pub fn verify_at(&self, code: &str, time: u64) -> bool {
        self.totp.check(code.trim(), time)
    }

    /// Code for the current time window.
    ///
    /// # Errors
    /// Returns an error if the system clock is before the Unix epoch.
    pub fn current_code(&self) -> Result<String> {
        self.totp
            .generate_current()
            .map_err(|e| anyhow!("system clock error: {e}"))
    }

    /// Code for an explicit Unix timestamp.
    #[must_use]
    pub fn code_at(&self, time: u64) -> String {
        self.totp.generate(time)
    }

    /// `otpauth://` provisioning URL for authenticator apps.
    #[must_use]
    pub fn provisioning_url(&self) -> String {
        self.totp.get_url()
    }

    /// Provisioning QR code as a base64 PNG for enrollment display.
    ///
    /// # Errors
    /// Returns an error if QR rendering fails.
    pub fn qr_png_base64(&self) -> Result<String> {
        self.totp
            .get_qr_base64()
            .map_err(|e| anyhow!("failed to render QR code: {e}"))
    }
}
