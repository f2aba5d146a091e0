use anyhow::{Context, Result};
use clap::{Arg, Command};
use secrecy::SecretString;

use super::{ARG_GENERATE_2FA_SECRET, ARG_HASH_PASSWORD};

pub fn with_args(command: Command) -> Command {
    let command = with_secret_args(command);
    with_session_args(command)
}

/// Secrets come from the environment in production; the flags exist so
/// `--help` documents them.
fn with_secret_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("admin-password-hash")
                .long("admin-password-hash")
                .help("bcrypt hash of the admin password")
                .env("ADMIN_PASSWORD_HASH")
                .hide_env_values(true)
                .required_unless_present_any([ARG_HASH_PASSWORD, ARG_GENERATE_2FA_SECRET]),
        )
        .arg(
            Arg::new("admin-jwt-secret")
                .long("admin-jwt-secret")
                .help("Secret used to sign session tokens")
                .env("ADMIN_JWT_SECRET")
                .hide_env_values(true)
                .required_unless_present_any([ARG_HASH_PASSWORD, ARG_GENERATE_2FA_SECRET]),
        )
        .arg(
            Arg::new("csrf-secret")
                .long("csrf-secret")
                .help("Secret used to derive CSRF tokens")
                .env("CSRF_SECRET")
                .hide_env_values(true)
                .required_unless_present_any([ARG_HASH_PASSWORD, ARG_GENERATE_2FA_SECRET]),
        )
        .arg(
            Arg::new("admin-2fa-secret")
                .long("admin-2fa-secret")
                .help("Base32 TOTP secret; setting it enables the 2FA step")
                .env("ADMIN_2FA_SECRET")
                .hide_env_values(true),
        )
}

fn with_session_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("frontend-base-url")
                .long("frontend-base-url")
                .help("Frontend base URL used for CORS and cookie security")
                .env("ZODIA_FRONTEND_BASE_URL")
                .default_value("https://zodia.app"),
        )
        .arg(
            Arg::new("session-ttl-seconds")
                .long("session-ttl-seconds")
                .help("Session cookie TTL in seconds")
                .env("ZODIA_SESSION_TTL_SECONDS")
                .default_value("28800")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("audit-retention-days")
                .long("audit-retention-days")
                .help("Days to keep audit entries before deletion")
                .env("ZODIA_AUDIT_RETENTION_DAYS")
                .default_value("365")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("retention-poll-seconds")
                .long("retention-poll-seconds")
                .help("Retention cleanup poll interval in seconds")
                .env("ZODIA_RETENTION_POLL_SECONDS")
                .default_value("3600")
                .value_parser(clap::value_parser!(u64)),
        )
}

/// Parsed auth options for the server action.
#[derive(Debug)]
pub struct Options {
    pub password_hash: String,
    pub jwt_secret: SecretString,
    pub csrf_secret: SecretString,
    pub totp_secret: Option<SecretString>,
    pub frontend_base_url: String,
    pub session_ttl_seconds: i64,
    pub audit_retention_days: i64,
    pub retention_poll_seconds: u64,
}

impl Options {
    /// Extract auth options from validated matches.
    ///
    /// # Errors
    /// Returns an error if a required argument is missing.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        let password_hash = matches
            .get_one::<String>("admin-password-hash")
            .cloned()
            .context("missing required argument: --admin-password-hash")?;
        let jwt_secret = matches
            .get_one::<String>("admin-jwt-secret")
            .cloned()
            .map(SecretString::from)
            .context("missing required argument: --admin-jwt-secret")?;
        let csrf_secret = matches
            .get_one::<String>("csrf-secret")
            .cloned()
            .map(SecretString::from)
            .context("missing required argument: --csrf-secret")?;
        let totp_secret = matches
            .get_one::<String>("admin-2fa-secret")
            .cloned()
            .map(SecretString::from);
        let frontend_base_url = matches
            .get_one::<String>("frontend-base-url")
            .cloned()
            .context("missing required argument: --frontend-base-url")?;
        let session_ttl_seconds = matches
            .get_one::<i64>("session-ttl-seconds")
            .copied()
            .unwrap_or(28_800);
        let audit_retention_days = matches
            .get_one::<i64>("audit-retention-days")
            .copied()
            .unwrap_or(365);
        let retention_poll_seconds = matches
            .get_one::<u64>("retention-poll-seconds")
            .copied()
            .unwrap_or(3600);

        Ok(Self {
            password_hash,
            jwt_secret,
            csrf_secret,
            totp_secret,
            frontend_base_url,
            session_ttl_seconds,
            audit_retention_days,
            retention_poll_seconds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_parse_from_env() {
        temp_env::with_vars(
            [
                ("ADMIN_PASSWORD_HASH", Some("$2b$12$abcdefghijklmnopqrstuv")),
                ("ADMIN_JWT_SECRET", Some("test-admin-jwt-secret-value")),
                ("CSRF_SECRET", Some("test-csrf-secret-value-here")),
                ("ADMIN_2FA_SECRET", None::<&str>),
                ("ZODIA_DSN", Some("postgres://localhost/zodia")),
            ],
            || {
                let command = crate::cli::commands::new();
                let matches = command.get_matches_from(vec!["zodia"]);
                let options = Options::parse(&matches).expect("options should parse");
                assert_eq!(options.password_hash, "$2b$12$abcdefghijklmnopqrstuv");
                assert!(options.totp_secret.is_none());
                assert_eq!(options.frontend_base_url, "https://zodia.app");
                assert_eq!(options.session_ttl_seconds, 28_800);
                assert_eq!(options.audit_retention_days, 365);
                assert_eq!(options.retention_poll_seconds, 3600);
            },
        );
    }

    #[test]
    fn secrets_required_for_server() {
        temp_env::with_vars(
            [
                ("ADMIN_PASSWORD_HASH", None::<&str>),
                ("ADMIN_JWT_SECRET", None::<&str>),
                ("CSRF_SECRET", None::<&str>),
                ("ZODIA_DSN", Some("postgres://localhost/zodia")),
            ],
            || {
                let command = crate::cli::commands::new();
                let result = command.try_get_matches_from(vec!["zodia"]);
                assert_eq!(
                    result.map(|_| ()).map_err(|e| e.kind()),
                    Err(clap::error::ErrorKind::MissingRequiredArgument)
                );
            },
        );
    }

    #[test]
    fn secrets_not_required_for_hash_password() {
        temp_env::with_vars(
            [
                ("ADMIN_PASSWORD_HASH", None::<&str>),
                ("ADMIN_JWT_SECRET", None::<&str>),
                ("CSRF_SECRET", None::<&str>),
                ("ZODIA_DSN", None::<&str>),
            ],
            || {
                let command = crate::cli::commands::new();
                let result = command
                    .try_get_matches_from(vec!["zodia", "--hash-password", "hunter2hunter2!"]);
                assert!(result.is_ok());
            },
        );
    }
}
