//! Command-line argument dispatch and server initialization.
//!
//! This module parses validated CLI arguments and maps them to the appropriate
//! action, such as starting the API server with its full configuration state.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::{ARG_GENERATE_2FA_SECRET, ARG_HASH_PASSWORD, auth};
use anyhow::{Context, Result};

/// Map validated CLI matches to an action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    if let Some(password) = matches.get_one::<String>(ARG_HASH_PASSWORD) {
        return Ok(Action::HashPassword {
            password: password.clone(),
        });
    }

    if matches.get_flag(ARG_GENERATE_2FA_SECRET) {
        return Ok(Action::Generate2faSecret);
    }

    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    let auth_opts = auth::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        password_hash: auth_opts.password_hash,
        jwt_secret: auth_opts.jwt_secret,
        csrf_secret: auth_opts.csrf_secret,
        totp_secret: auth_opts.totp_secret,
        frontend_base_url: auth_opts.frontend_base_url,
        session_ttl_seconds: auth_opts.session_ttl_seconds,
        audit_retention_days: auth_opts.audit_retention_days,
        retention_poll_seconds: auth_opts.retention_poll_seconds,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatches_server_action() {
        temp_env::with_vars(
            [
                (
                    "ADMIN_PASSWORD_HASH",
                    Some("$2b$12$abcdefghijklmnopqrstuv"),
                ),
                ("ADMIN_JWT_SECRET", Some("test-admin-jwt-secret-value")),
                ("CSRF_SECRET", Some("test-csrf-secret-value-here")),
                ("ADMIN_2FA_SECRET", None::<&str>),
                ("ZODIA_DSN", Some("postgres://localhost/zodia")),
            ],
            || {
                let command = crate::cli::commands::new();
                let matches = command.get_matches_from(vec!["zodia"]);
                let action = handler(&matches).expect("server action");
                match action {
                    Action::Server(args) => {
                        assert_eq!(args.port, 8080);
                        assert_eq!(args.dsn, "postgres://localhost/zodia");
                        assert!(args.totp_secret.is_none());
                    }
                    other => panic!("expected server action, got {other:?}"),
                }
            },
        );
    }

    #[test]
    fn dispatches_hash_password_action() {
        let command = crate::cli::commands::new();
        let matches =
            command.get_matches_from(vec!["zodia", "--hash-password", "hunter2hunter2!"]);
        let action = handler(&matches).expect("hash-password action");
        match action {
            Action::HashPassword { password } => assert_eq!(password, "hunter2hunter2!"),
            other => panic!("expected hash-password action, got {other:?}"),
        }
    }

    #[test]
    fn dispatches_generate_2fa_secret_action() {
        let command = crate::cli::commands::new();
        let matches = command.get_matches_from(vec!["zodia", "--generate-2fa-secret"]);
        let action = handler(&matches).expect("generate-2fa-secret action");
        assert!(matches!(action, Action::Generate2faSecret));
    }
}
