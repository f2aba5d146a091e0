//! Read endpoints over the audit trail.

use axum::{
    Extension, Json,
    extract::Query,
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use sqlx::PgPool;
use std::sync::Arc;

use super::gate::require_admin_auth;
use super::internal_error;
use super::state::AdminState;
use super::types::{AuditLogsQuery, AuditStatsQuery, ErrorResponse};
use crate::audit::{self, AuditLogFilter, AuditLogPage, AuditStatistics};

const DEFAULT_STATS_DAYS: u32 = 30;

/// Page through audit entries, newest first.
#[utoipa::path(
    get,
    path = "/v1/admin/audit-logs",
    params(AuditLogsQuery),
    responses(
        (status = 200, description = "One page of audit entries", body = AuditLogPage),
        (status = 401, description = "No valid session", body = ErrorResponse),
    ),
    tag = "admin"
)]
pub async fn audit_logs(
    Extension(state): Extension<Arc<AdminState>>,
    Extension(pool): Extension<PgPool>,
    headers: HeaderMap,
    Query(query): Query<AuditLogsQuery>,
) -> Response {
    if let Err(response) =
        require_admin_auth(&headers, &state, &pool, Some(audit::ACTION_AUDIT_LOGS_VIEWED)).await
    {
        return response;
    }

    let filter = AuditLogFilter {
        action: query.action,
        page: query.page.unwrap_or(0),
        per_page: query.per_page.unwrap_or(0),
    };
    match audit::list(&pool, filter).await {
        Ok(page) => Json(page).into_response(),
        Err(err) => internal_error(&err),
    }
}

/// Aggregate counts over a trailing window for the dashboard.
#[utoipa::path(
    get,
    path = "/v1/admin/audit-stats",
    params(AuditStatsQuery),
    responses(
        (status = 200, description = "Audit aggregates", body = AuditStatistics),
        (status = 401, description = "No valid session", body = ErrorResponse),
    ),
    tag = "admin"
)]
pub async fn audit_stats(
    Extension(state): Extension<Arc<AdminState>>,
    Extension(pool): Extension<PgPool>,
    headers: HeaderMap,
    Query(query): Query<AuditStatsQuery>,
) -> Response {
    if let Err(response) =
        require_admin_auth(&headers, &state, &pool, Some(audit::ACTION_AUDIT_STATS_VIEWED)).await
    {
        return response;
    }

    let days = query.days.unwrap_or(DEFAULT_STATS_DAYS);
    match audit::statistics(&pool, days).await {
        Ok(stats) => Json(stats).into_response(),
        Err(err) => internal_error(&err),
    }
}
