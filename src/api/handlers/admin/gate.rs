//! The auth gate every protected admin route calls first.

use axum::{
    Json,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::json;
use sqlx::PgPool;
use tracing::debug;

use super::cookies::{
    CSRF_COOKIE_NAME, SESSION_COOKIE_NAME, extract_client_ip, extract_cookie, extract_user_agent,
};
use super::state::AdminState;
use super::types::ErrorResponse;
use crate::audit::{self, NewAuditEntry};
use crate::auth::{csrf, session::AdminSessionClaims};

/// Request header carrying the double-submit CSRF token.
pub(crate) const CSRF_HEADER_NAME: &str = "x-csrf-token";

/// Authorize a request to a protected admin route.
///
/// Missing, expired, and tampered sessions all produce the same denial;
/// the distinction survives only in the process log. When `action` is
/// supplied, a successful pass writes an audit entry (best-effort), so
/// read-only admin access shows up in the trail too. Routes that write
/// their own, richer entry pass `None`.
///
/// # Errors
/// Returns the ready-made 401 response when the session is absent or
/// fails verification.
pub async fn require_admin_auth(
    headers: &HeaderMap,
    state: &AdminState,
    pool: &PgPool,
    action: Option<&str>,
) -> Result<AdminSessionClaims, Response> {
    let claims = verify_session(headers, state)?;
    if let Some(action) = action {
        audit::record(pool, access_entry(action, headers, &claims)).await;
    }
    Ok(claims)
}

fn verify_session(
    headers: &HeaderMap,
    state: &AdminState,
) -> Result<AdminSessionClaims, Response> {
    let token = extract_cookie(headers, SESSION_COOKIE_NAME);
    let claims = token
        .as_deref()
        .and_then(|token| state.sessions().verify(token));

    claims.ok_or_else(|| {
        let reason = if token.is_none() {
            "missing_session"
        } else {
            "invalid_or_expired_session"
        };
        debug!(reason, "admin request denied");
        unauthorized()
    })
}

/// The entry recorded when a labeled route passes the gate.
fn access_entry(action: &str, headers: &HeaderMap, claims: &AdminSessionClaims) -> NewAuditEntry {
    NewAuditEntry::new(action)
        .with_ip(extract_client_ip(headers))
        .with_user_agent(extract_user_agent(headers))
        .with_metadata(json!({ "jti": claims.jti }))
}

/// Double-submit CSRF check for state-changing admin routes.
///
/// # Errors
/// Returns a ready-made 403 when the header and cookie tokens do not
/// byte-match or either is malformed.
pub fn require_csrf(headers: &HeaderMap) -> Result<(), Response> {
    let header_token = headers
        .get(CSRF_HEADER_NAME)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let cookie_token = extract_cookie(headers, CSRF_COOKIE_NAME).unwrap_or_default();

    if csrf::verify(header_token, &cookie_token) {
        Ok(())
    } else {
        debug!("request rejected by CSRF check");
        Err(csrf_mismatch())
    }
}

/// The single 401 shape for every denial on the admin surface.
#[must_use]
pub fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: "Unauthorized".to_string(),
        }),
    )
        .into_response()
}

fn csrf_mismatch() -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(ErrorResponse {
            error: "CSRF token mismatch".to_string(),
        }),
    )
        .into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::handlers::admin::state::tests::test_config;
    use axum::http::HeaderValue;

    #[test]
    fn gate_accepts_valid_session_cookie() {
        let state = AdminState::new(test_config()).unwrap();
        let session = state.sessions().issue().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_str(&format!("{SESSION_COOKIE_NAME}={}", session.token)).unwrap(),
        );
        let claims = verify_session(&headers, &state).unwrap();
        assert_eq!(claims.jti, session.claims.jti);
    }

    #[test]
    fn gate_rejects_missing_cookie() {
        let state = AdminState::new(test_config()).unwrap();
        let headers = HeaderMap::new();
        assert!(verify_session(&headers, &state).is_err());
    }

    #[test]
    fn gate_rejects_garbage_token() {
        let state = AdminState::new(test_config()).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_static("admin_session=not.a.token"),
        );
        assert!(verify_session(&headers, &state).is_err());
    }

    #[test]
    fn access_entry_carries_action_and_session_id() {
        let state = AdminState::new(test_config()).unwrap();
        let session = state.sessions().issue().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("user-agent", HeaderValue::from_static("curl/8"));
        let entry = access_entry(
            crate::audit::ACTION_AUDIT_LOGS_VIEWED,
            &headers,
            &session.claims,
        );
        let rendered = format!("{entry:?}");
        assert!(rendered.contains(crate::audit::ACTION_AUDIT_LOGS_VIEWED));
        assert!(rendered.contains(&session.claims.jti));
        assert!(rendered.contains("curl/8"));
    }

    #[test]
    fn require_csrf_accepts_matching_pair() {
        let token = csrf::generate(b"csrf-secret");
        let mut headers = HeaderMap::new();
        headers.insert(
            CSRF_HEADER_NAME,
            HeaderValue::from_str(&token).unwrap(),
        );
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_str(&format!("{CSRF_COOKIE_NAME}={token}")).unwrap(),
        );
        assert!(require_csrf(&headers).is_ok());
    }

    #[test]
    fn require_csrf_rejects_missing_header() {
        let token = csrf::generate(b"csrf-secret");
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_str(&format!("{CSRF_COOKIE_NAME}={token}")).unwrap(),
        );
        assert!(require_csrf(&headers).is_err());
    }

    #[test]
    fn require_csrf_rejects_mismatched_tokens() {
        let mut headers = HeaderMap::new();
        headers.insert(
            CSRF_HEADER_NAME,
            HeaderValue::from_str(&csrf::generate(b"csrf-secret")).unwrap(),
        );
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_str(&format!(
                "{CSRF_COOKIE_NAME}={}",
                csrf::generate(b"csrf-secret")
            ))
            .unwrap(),
        );
        assert!(require_csrf(&headers).is_err());
    }

    #[test]
    fn unauthorized_is_401() {
        let response = unauthorized();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn csrf_mismatch_is_403() {
        let response = csrf_mismatch();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
