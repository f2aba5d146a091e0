//! Recovery code status and regeneration.

use axum::{
    Extension, Json,
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

use super::cookies::{extract_client_ip, extract_user_agent};
use super::gate::{require_admin_auth, require_csrf};
use super::internal_error;
use super::state::AdminState;
use super::storage;
use super::types::{ErrorResponse, RecoveryCodesGeneratedResponse, RecoveryCodesStatusResponse};
use crate::audit::{self, NewAuditEntry};
use crate::auth::recovery::{RECOVERY_CODE_COUNT, RecoveryCodeBatch};

/// How many recovery codes remain redeemable.
#[utoipa::path(
    get,
    path = "/v1/admin/recovery-codes",
    responses(
        (status = 200, description = "Recovery code status", body = RecoveryCodesStatusResponse),
        (status = 401, description = "No valid session", body = ErrorResponse),
    ),
    tag = "admin"
)]
pub async fn recovery_codes_status(
    Extension(state): Extension<Arc<AdminState>>,
    Extension(pool): Extension<PgPool>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_admin_auth(
        &headers,
        &state,
        &pool,
        Some(audit::ACTION_RECOVERY_CODES_VIEWED),
    )
    .await
    {
        return response;
    }

    let remaining = match storage::remaining_count(&pool).await {
        Ok(remaining) => remaining,
        Err(err) => return internal_error(&err),
    };

    Json(RecoveryCodesStatusResponse {
        remaining,
        total: RECOVERY_CODE_COUNT as i64,
        two_factor_enabled: state.two_factor_enabled(),
    })
    .into_response()
}

/// Replace the recovery codes with a fresh batch.
///
/// The plaintext codes appear in this response and nowhere else; all
/// unused codes from earlier batches stop working immediately.
#[utoipa::path(
    post,
    path = "/v1/admin/recovery-codes",
    responses(
        (status = 200, description = "New codes generated", body = RecoveryCodesGeneratedResponse),
        (status = 401, description = "No valid session", body = ErrorResponse),
        (status = 403, description = "CSRF token mismatch", body = ErrorResponse),
    ),
    tag = "admin"
)]
pub async fn regenerate_recovery_codes(
    Extension(state): Extension<Arc<AdminState>>,
    Extension(pool): Extension<PgPool>,
    headers: HeaderMap,
) -> Response {
    // The regeneration itself is audited below with the batch metadata,
    // so the gate skips its generic entry here.
    if let Err(response) = require_admin_auth(&headers, &state, &pool, None).await {
        return response;
    }
    if let Err(response) = require_csrf(&headers) {
        return response;
    }

    let batch = match RecoveryCodeBatch::generate() {
        Ok(batch) => batch,
        Err(err) => return internal_error(&err),
    };
    if let Err(err) = storage::replace_recovery_codes(&pool, batch.batch_id, &batch.code_hashes).await
    {
        return internal_error(&err);
    }

    audit::record(
        &pool,
        NewAuditEntry::new(audit::ACTION_RECOVERY_CODES_GENERATED)
            .with_ip(extract_client_ip(&headers))
            .with_user_agent(extract_user_agent(&headers))
            .with_metadata(json!({
                "batch_id": batch.batch_id,
                "count": batch.codes.len(),
            })),
    )
    .await;

    Json(RecoveryCodesGeneratedResponse {
        remaining: batch.codes.len() as i64,
        codes: batch.codes,
    })
    .into_response()
}
