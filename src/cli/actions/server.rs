use crate::{
    api,
    api::handlers::admin::state::AdminConfig,
    audit::retention::RetentionConfig,
};
use anyhow::Result;
use secrecy::SecretString;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub password_hash: String,
    pub jwt_secret: SecretString,
    pub csrf_secret: SecretString,
    pub totp_secret: Option<SecretString>,
    pub frontend_base_url: String,
    pub session_ttl_seconds: i64,
    pub audit_retention_days: i64,
    pub retention_poll_seconds: u64,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the configuration is invalid or the server fails to start.
pub async fn handle(args: Args) -> Result<()> {
    let admin_config = AdminConfig::new(
        args.frontend_base_url,
        args.password_hash,
        args.jwt_secret,
        args.csrf_secret,
    )
    .with_session_ttl_seconds(args.session_ttl_seconds)
    .with_totp_secret(args.totp_secret);

    let retention_config =
        RetentionConfig::new(args.audit_retention_days, args.retention_poll_seconds);

    api::new(args.port, args.dsn, admin_config, retention_config).await
}
