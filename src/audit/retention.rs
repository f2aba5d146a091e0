//! Data-retention cleanup for audit entries and used recovery codes.
//!
//! A background worker polls on a fixed cadence and deletes rows past
//! their retention window. This is the only deletion path for either
//! table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{Instrument, error, info, info_span};

const DEFAULT_AUDIT_RETENTION_DAYS: i64 = 365;
const DEFAULT_RECOVERY_CODE_RETENTION_DAYS: i64 = 30;
const DEFAULT_POLL_SECONDS: u64 = 3600;

/// Retention windows and poll cadence, normalized at worker start.
#[derive(Clone, Debug)]
pub struct RetentionConfig {
    audit_retention_days: i64,
    recovery_code_retention_days: i64,
    poll_seconds: u64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            audit_retention_days: DEFAULT_AUDIT_RETENTION_DAYS,
            recovery_code_retention_days: DEFAULT_RECOVERY_CODE_RETENTION_DAYS,
            poll_seconds: DEFAULT_POLL_SECONDS,
        }
    }
}

impl RetentionConfig {
    #[must_use]
    pub fn new(audit_retention_days: i64, poll_seconds: u64) -> Self {
        Self {
            audit_retention_days,
            recovery_code_retention_days: DEFAULT_RECOVERY_CODE_RETENTION_DAYS,
            poll_seconds,
        }
    }

    /// Zero or negative values fall back to the defaults.
    #[must_use]
    pub fn normalize(mut self) -> Self {
        if self.audit_retention_days <= 0 {
            self.audit_retention_days = DEFAULT_AUDIT_RETENTION_DAYS;
        }
        if self.recovery_code_retention_days <= 0 {
            self.recovery_code_retention_days = DEFAULT_RECOVERY_CODE_RETENTION_DAYS;
        }
        if self.poll_seconds == 0 {
            self.poll_seconds = DEFAULT_POLL_SECONDS;
        }
        self
    }

    #[must_use]
    pub const fn audit_retention_days(&self) -> i64 {
        self.audit_retention_days
    }

    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_seconds)
    }
}

/// Spawn the cleanup loop. Failures are logged and the loop keeps going.
pub fn spawn_cleanup_worker(pool: PgPool, config: RetentionConfig) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let config = config.normalize();
        let poll_interval = config.poll_interval();

        loop {
            if let Err(err) = run_cleanup(&pool, &config).await {
                error!("retention cleanup failed: {err}");
            }
            sleep(poll_interval).await;
        }
    })
}

/// One cleanup pass; returns the number of rows deleted.
///
/// # Errors
/// Returns an error if either delete fails.
pub async fn run_cleanup(pool: &PgPool, config: &RetentionConfig) -> Result<u64> {
    let query = r"
        DELETE FROM admin_audit_log
        WHERE created_at < NOW() - ($1 * INTERVAL '1 day')
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    let audit_deleted = sqlx::query(query)
        .bind(config.audit_retention_days)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to delete expired audit entries")?
        .rows_affected();

    // Unused codes stay valid indefinitely; only redeemed ones age out.
    let query = r"
        DELETE FROM admin_recovery_codes
        WHERE used_at IS NOT NULL
          AND used_at < NOW() - ($1 * INTERVAL '1 day')
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    let codes_deleted = sqlx::query(query)
        .bind(config.recovery_code_retention_days)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to delete expired recovery codes")?
        .rows_affected();

    let deleted = audit_deleted + codes_deleted;
    if deleted > 0 {
        info!(audit_deleted, codes_deleted, "retention cleanup pass complete");
    }
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_falls_back_on_invalid_values() {
        let config = RetentionConfig::new(0, 0).normalize();
        assert_eq!(config.audit_retention_days(), DEFAULT_AUDIT_RETENTION_DAYS);
        assert_eq!(
            config.poll_interval(),
            Duration::from_secs(DEFAULT_POLL_SECONDS)
        );
    }

    #[test]
    fn normalize_keeps_valid_values() {
        let config = RetentionConfig::new(90, 600).normalize();
        assert_eq!(config.audit_retention_days(), 90);
        assert_eq!(config.poll_interval(), Duration::from_secs(600));
    }
}
