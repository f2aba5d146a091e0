//! Actions the CLI can dispatch to.

pub mod hash_password;
pub mod server;
pub mod two_factor;

/// What the invocation asked for.
#[derive(Debug)]
pub enum Action {
    /// Run the API server.
    Server(server::Args),
    /// Hash a password for `ADMIN_PASSWORD_HASH` and exit.
    HashPassword { password: String },
    /// Generate a TOTP secret for `ADMIN_2FA_SECRET` and exit.
    Generate2faSecret,
}
