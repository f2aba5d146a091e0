//! Append-only audit log for security-relevant admin events.
//!
//! Entries are never updated; the only deletion path is the retention
//! worker. Writes are best-effort: if the database is unavailable the
//! failure is logged and the admin action proceeds — availability of the
//! admin function takes priority over completeness of the audit trail.

pub mod retention;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgPool, Row};
use tracing::{Instrument, error, info_span};
use utoipa::ToSchema;

pub const ACTION_LOGIN: &str = "admin_login";
pub const ACTION_LOGIN_FAILED: &str = "admin_login_failed";
pub const ACTION_LOGOUT: &str = "admin_logout";
pub const ACTION_RECOVERY_CODES_GENERATED: &str = "recovery_codes_generated";
pub const ACTION_SESSION_CHECKED: &str = "session_checked";
pub const ACTION_RECOVERY_CODES_VIEWED: &str = "recovery_codes_viewed";
pub const ACTION_AUDIT_LOGS_VIEWED: &str = "audit_logs_viewed";
pub const ACTION_AUDIT_STATS_VIEWED: &str = "audit_stats_viewed";

const DEFAULT_PER_PAGE: u32 = 50;
const MAX_PER_PAGE: u32 = 200;

/// A stored audit entry as returned by the query endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuditLogEntry {
    pub id: i64,
    pub action: String,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// An entry about to be appended.
#[derive(Debug)]
pub struct NewAuditEntry {
    action: String,
    ip: Option<String>,
    user_agent: Option<String>,
    metadata: serde_json::Value,
}

impl NewAuditEntry {
    #[must_use]
    pub fn new(action: &str) -> Self {
        Self {
            action: action.to_string(),
            ip: None,
            user_agent: None,
            metadata: serde_json::Value::Null,
        }
    }

    #[must_use]
    pub fn with_ip(mut self, ip: Option<String>) -> Self {
        self.ip = ip;
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: Option<String>) -> Self {
        self.user_agent = user_agent;
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Append an entry, swallowing storage failures.
///
/// The failure still reaches the process log so a broken audit pipeline
/// is visible to operators.
pub async fn record(pool: &PgPool, entry: NewAuditEntry) {
    if let Err(err) = insert(pool, &entry).await {
        error!(action = %entry.action, "failed to write audit entry: {err}");
    }
}

async fn insert(pool: &PgPool, entry: &NewAuditEntry) -> Result<()> {
    let metadata_text =
        serde_json::to_string(&entry.metadata).context("failed to serialize audit metadata")?;
    let query = r"
        INSERT INTO admin_audit_log (action, ip, user_agent, metadata)
        VALUES ($1, $2, $3, $4::jsonb)
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(&entry.action)
        .bind(&entry.ip)
        .bind(&entry.user_agent)
        .bind(metadata_text)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to insert audit entry")?;
    Ok(())
}

/// Filter and pagination for the audit query endpoint.
#[derive(Clone, Debug, Default)]
pub struct AuditLogFilter {
    pub action: Option<String>,
    pub page: u32,
    pub per_page: u32,
}

impl AuditLogFilter {
    /// Clamp pagination to sane bounds; page numbering is 1-based.
    #[must_use]
    pub fn normalize(mut self) -> Self {
        if self.page == 0 {
            self.page = 1;
        }
        if self.per_page == 0 {
            self.per_page = DEFAULT_PER_PAGE;
        }
        self.per_page = self.per_page.min(MAX_PER_PAGE);
        self.action = self.action.filter(|action| !action.trim().is_empty());
        self
    }

    fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.per_page)
    }
}

/// One page of audit entries plus the total match count.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuditLogPage {
    pub entries: Vec<AuditLogEntry>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

/// List audit entries, newest first.
///
/// # Errors
/// Returns an error if either query fails.
pub async fn list(pool: &PgPool, filter: AuditLogFilter) -> Result<AuditLogPage> {
    let filter = filter.normalize();

    let query = r"
        SELECT COUNT(*) AS total
        FROM admin_audit_log
        WHERE ($1::text IS NULL OR action = $1)
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let total: i64 = sqlx::query(query)
        .bind(&filter.action)
        .fetch_one(pool)
        .instrument(span)
        .await
        .context("failed to count audit entries")?
        .get("total");

    let query = r"
        SELECT id, action, ip, user_agent, metadata::text AS metadata, created_at
        FROM admin_audit_log
        WHERE ($1::text IS NULL OR action = $1)
        ORDER BY created_at DESC, id DESC
        LIMIT $2 OFFSET $3
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let rows = sqlx::query(query)
        .bind(&filter.action)
        .bind(i64::from(filter.per_page))
        .bind(filter.offset())
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to list audit entries")?;

    let entries = rows
        .into_iter()
        .map(|row| {
            let metadata_text: String = row.get("metadata");
            AuditLogEntry {
                id: row.get("id"),
                action: row.get("action"),
                ip: row.get("ip"),
                user_agent: row.get("user_agent"),
                metadata: serde_json::from_str(&metadata_text)
                    .unwrap_or(serde_json::Value::Null),
                created_at: row.get("created_at"),
            }
        })
        .collect();

    Ok(AuditLogPage {
        entries,
        total,
        page: filter.page,
        per_page: filter.per_page,
    })
}

/// Per-action count for the statistics aggregate.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionCount {
    pub action: String,
    pub count: i64,
}

/// Aggregates over the last `days` days for the admin dashboard.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuditStatistics {
    pub days: u32,
    pub total: i64,
    pub logins: i64,
    pub failed_logins: i64,
    pub logouts: i64,
    pub distinct_ips: i64,
    pub by_action: Vec<ActionCount>,
}

/// Compute audit aggregates over a trailing window.
///
/// # Errors
/// Returns an error if either query fails.
pub async fn statistics(pool: &PgPool, days: u32) -> Result<AuditStatistics> {
    let days = days.clamp(1, 365);

    let query = r"
        SELECT COUNT(*) AS total,
               COUNT(*) FILTER (WHERE action = 'admin_login') AS logins,
               COUNT(*) FILTER (WHERE action = 'admin_login_failed') AS failed_logins,
               COUNT(*) FILTER (WHERE action = 'admin_logout') AS logouts,
               COUNT(DISTINCT ip) AS distinct_ips
        FROM admin_audit_log
        WHERE created_at > NOW() - ($1 * INTERVAL '1 day')
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(i64::from(days))
        .fetch_one(pool)
        .instrument(span)
        .await
        .context("failed to aggregate audit statistics")?;

    let query = r"
        SELECT action, COUNT(*) AS count
        FROM admin_audit_log
        WHERE created_at > NOW() - ($1 * INTERVAL '1 day')
        GROUP BY action
        ORDER BY count DESC, action ASC
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let by_action = sqlx::query(query)
        .bind(i64::from(days))
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to aggregate per-action counts")?
        .into_iter()
        .map(|row| ActionCount {
            action: row.get("action"),
            count: row.get("count"),
        })
        .collect();

    Ok(AuditStatistics {
        days,
        total: row.get("total"),
        logins: row.get("logins"),
        failed_logins: row.get("failed_logins"),
        logouts: row.get("logouts"),
        distinct_ips: row.get("distinct_ips"),
        by_action,
    })
}
