//! Session introspection and logout.

use axum::{
    Extension, Json,
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

use super::cookies::{
    SESSION_COOKIE_NAME, clear_csrf_cookie, clear_session_cookie, extract_client_ip,
    extract_cookie, extract_user_agent,
};
use super::gate::{require_admin_auth, require_csrf};
use super::internal_error;
use super::state::AdminState;
use super::types::{ErrorResponse, SessionStatusResponse};
use crate::audit::{self, NewAuditEntry};

/// Report whether the caller holds a valid session and when it expires.
#[utoipa::path(
    get,
    path = "/v1/admin/session",
    responses(
        (status = 200, description = "Session is valid", body = SessionStatusResponse),
        (status = 401, description = "No valid session", body = ErrorResponse),
    ),
    tag = "admin"
)]
pub async fn session_status(
    Extension(state): Extension<Arc<AdminState>>,
    Extension(pool): Extension<PgPool>,
    headers: HeaderMap,
) -> Response {
    let claims = match require_admin_auth(
        &headers,
        &state,
        &pool,
        Some(audit::ACTION_SESSION_CHECKED),
    )
    .await
    {
        Ok(claims) => claims,
        Err(response) => return response,
    };

    Json(SessionStatusResponse {
        issued_at: claims.iat,
        expires_at: claims.exp,
    })
    .into_response()
}

/// End the session by expiring both cookies.
///
/// Logout is idempotent: the cookies are cleared whether or not the
/// presented session is still valid, and only a valid session produces
/// an audit entry.
#[utoipa::path(
    post,
    path = "/v1/admin/logout",
    responses(
        (status = 204, description = "Session cleared"),
        (status = 403, description = "CSRF token mismatch", body = ErrorResponse),
    ),
    tag = "admin"
)]
pub async fn logout(
    Extension(state): Extension<Arc<AdminState>>,
    Extension(pool): Extension<PgPool>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_csrf(&headers) {
        return response;
    }

    let claims = extract_cookie(&headers, SESSION_COOKIE_NAME)
        .and_then(|token| state.sessions().verify(&token));
    if let Some(claims) = claims {
        audit::record(
            &pool,
            NewAuditEntry::new(audit::ACTION_LOGOUT)
                .with_ip(extract_client_ip(&headers))
                .with_user_agent(extract_user_agent(&headers))
                .with_metadata(json!({ "jti": claims.jti })),
        )
        .await;
    }

    let mut response_headers = HeaderMap::new();
    let session_value = match clear_session_cookie(state.config()) {
        Ok(value) => value,
        Err(err) => return internal_error(&err.into()),
    };
    let csrf_value = match clear_csrf_cookie(state.config()) {
        Ok(value) => value,
        Err(err) => return internal_error(&err.into()),
    };
    response_headers.append(SET_COOKIE, session_value);
    response_headers.append(SET_COOKIE, csrf_value);

    (StatusCode::NO_CONTENT, response_headers).into_response()
}
