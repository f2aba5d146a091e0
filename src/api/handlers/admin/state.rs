//! Admin auth state and configuration.
//!
//! All secrets are read once at startup and carried here; business logic
//! never touches the environment directly, so every handler can be
//! exercised in tests with a directly constructed state.

use anyhow::{Context, Result, anyhow};
use secrecy::{ExposeSecret, SecretString};

use crate::auth::{session::SessionIssuer, totp::TotpEngine};

const DEFAULT_SESSION_TTL_SECONDS: i64 = 8 * 60 * 60;
const MIN_SECRET_LEN: usize = 16;

/// Account label shown in authenticator apps for the shared TOTP secret.
const TOTP_ACCOUNT: &str = "admin@zodia.app";

#[derive(Clone, Debug)]
pub struct AdminConfig {
    frontend_base_url: String,
    session_ttl_seconds: i64,
    password_hash: String,
    jwt_secret: SecretString,
    csrf_secret: SecretString,
    totp_secret: Option<SecretString>,
}

impl AdminConfig {
    #[must_use]
    pub fn new(
        frontend_base_url: String,
        password_hash: String,
        jwt_secret: SecretString,
        csrf_secret: SecretString,
    ) -> Self {
        Self {
            frontend_base_url,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            password_hash,
            jwt_secret,
            csrf_secret,
            totp_secret: None,
        }
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    /// Absence of the TOTP secret disables the 2FA step entirely.
    #[must_use]
    pub fn with_totp_secret(mut self, secret: Option<SecretString>) -> Self {
        self.totp_secret = secret;
        self
    }

    #[must_use]
    pub fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    /// Only mark cookies secure when the frontend is served over HTTPS.
    #[must_use]
    pub fn cookie_secure(&self) -> bool {
        self.frontend_base_url.starts_with("https://")
    }

    pub(crate) fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    pub(crate) fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub(crate) fn jwt_secret(&self) -> &SecretString {
        &self.jwt_secret
    }

    pub(crate) fn csrf_secret(&self) -> &SecretString {
        &self.csrf_secret
    }

    pub(crate) fn totp_secret(&self) -> Option<&SecretString> {
        self.totp_secret.as_ref()
    }
}

/// Process-wide admin auth state: configuration plus the session issuer
/// and optional TOTP engine built from it.
pub struct AdminState {
    config: AdminConfig,
    sessions: SessionIssuer,
    totp: Option<TotpEngine>,
}

impl AdminState {
    /// Build the state, validating secrets up front so misconfiguration
    /// fails at startup instead of at first login.
    ///
    /// # Errors
    /// Returns an error if a required secret is too short or the TOTP
    /// secret is not valid base32.
    pub fn new(config: AdminConfig) -> Result<Self> {
        if config.jwt_secret.expose_secret().len() < MIN_SECRET_LEN {
            return Err(anyhow!(
                "ADMIN_JWT_SECRET must be at least {MIN_SECRET_LEN} characters"
            ));
        }
        if config.csrf_secret.expose_secret().len() < MIN_SECRET_LEN {
            return Err(anyhow!(
                "CSRF_SECRET must be at least {MIN_SECRET_LEN} characters"
            ));
        }

        let sessions = SessionIssuer::new(
            config.jwt_secret.expose_secret().as_bytes(),
            config.session_ttl_seconds,
        );
        let totp = config
            .totp_secret
            .as_ref()
            .map(|secret| {
                TotpEngine::from_base32(secret.expose_secret(), TOTP_ACCOUNT)
                    .context("invalid ADMIN_2FA_SECRET")
            })
            .transpose()?;

        Ok(Self {
            config,
            sessions,
            totp,
        })
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.config
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionIssuer {
        &self.sessions
    }

    /// `None` means the 2FA step is disabled.
    #[must_use]
    pub fn totp(&self) -> Option<&TotpEngine> {
        self.totp.as_ref()
    }

    #[must_use]
    pub fn two_factor_enabled(&self) -> bool {
        self.totp.is_some()
    }

    pub(crate) fn password_hash(&self) -> &str {
        self.config.password_hash()
    }

    pub(crate) fn csrf_secret_bytes(&self) -> &[u8] {
        self.config.csrf_secret().expose_secret().as_bytes()
    }

    pub(crate) fn jwt_secret_meets_minimum(&self) -> bool {
        self.config.jwt_secret().expose_secret().len() >= MIN_SECRET_LEN
    }

    pub(crate) fn csrf_secret_meets_minimum(&self) -> bool {
        self.config.csrf_secret().expose_secret().len() >= MIN_SECRET_LEN
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const TEST_TOTP_SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

    pub(crate) fn test_config() -> AdminConfig {
        AdminConfig::new(
            "https://zodia.app".to_string(),
            crate::auth::password::hash("correct horse battery staple").unwrap(),
            SecretString::from("test-admin-jwt-secret-value"),
            SecretString::from("test-csrf-secret-value-here"),
        )
    }

    #[test]
    fn config_defaults_and_overrides() {
        let config = test_config();
        assert_eq!(config.session_ttl_seconds(), DEFAULT_SESSION_TTL_SECONDS);
        assert!(config.cookie_secure());

        let config = config.with_session_ttl_seconds(60);
        assert_eq!(config.session_ttl_seconds(), 60);
    }

    #[test]
    fn cookie_secure_follows_frontend_scheme() {
        let mut config = test_config();
        config.frontend_base_url = "http://localhost:3000".to_string();
        assert!(!config.cookie_secure());
    }

    #[test]
    fn state_without_totp_secret_disables_2fa() {
        let state = AdminState::new(test_config()).unwrap();
        assert!(!state.two_factor_enabled());
        assert!(state.totp().is_none());
    }

    #[test]
    fn state_with_totp_secret_enables_2fa() {
        let config = test_config().with_totp_secret(Some(SecretString::from(TEST_TOTP_SECRET)));
        let state = AdminState::new(config).unwrap();
        assert!(state.two_factor_enabled());
    }

    #[test]
    fn state_rejects_short_secrets() {
        let config = AdminConfig::new(
            "https://zodia.app".to_string(),
            "hash".to_string(),
            SecretString::from("short"),
            SecretString::from("test-csrf-secret-value-here"),
        );
        assert!(AdminState::new(config).is_err());
    }

    #[test]
    fn state_rejects_invalid_totp_secret() {
        let config = test_config().with_totp_secret(Some(SecretString::from("not base32!!")));
        assert!(AdminState::new(config).is_err());
    }
}
