use crate::auth::totp::TotpEngine;
use anyhow::Result;

const ACCOUNT: &str = "admin@zodia.app";

/// Generate a fresh TOTP secret for `ADMIN_2FA_SECRET` and print the
/// provisioning URL plus a QR code (base64 PNG) for authenticator apps.
///
/// # Errors
/// Returns an error if the generated secret is unusable or QR rendering fails.
pub fn handle() -> Result<()> {
    let secret = TotpEngine::generate_secret_base32();
    let engine = TotpEngine::from_base32(&secret, ACCOUNT)?;

    println!("ADMIN_2FA_SECRET={secret}");
    println!("otpauth: {}", engine.provisioning_url());
    println!("qr (base64 PNG): {}", engine.qr_png_base64()?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_secret_builds_an_engine() {
        assert!(handle().is_ok());
    }
}
