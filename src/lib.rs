//! # Zodia Admin Authentication Service
//!
//! `zodia` is the administrative authentication authority for the Zodia
//! astrology platform. It fronts every `/v1/admin/*` route with a single
//! auth gate and owns the credentials used to pass it.
//!
//! ## Authentication model
//!
//! There is a single admin principal. Login requires the admin password
//! (bcrypt hash held in server configuration) and, when a TOTP secret is
//! configured, a second factor: either a current TOTP code or a one-time
//! recovery code. The presence of `ADMIN_2FA_SECRET` is itself the "2FA
//! enabled" flag.
//!
//! ## Sessions
//!
//! Sessions are stateless: a signed token (`role`, `iat`, `exp`, `jti`)
//! carried in an `HttpOnly` cookie. There is no server-side session store
//! and no refresh transition; expiry forces a full re-login. The trade-off
//! is that a single session cannot be revoked before its expiry, which is
//! acceptable for an admin-only, low-traffic surface.
//!
//! ## Audit trail
//!
//! Every security-relevant event (login success/failure, logout, gated
//! admin access) is appended to `admin_audit_log`. Audit writes are
//! best-effort: a storage failure is logged and the admin action proceeds.

pub mod api;
pub mod audit;
pub mod auth;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
