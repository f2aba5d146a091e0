//! Admin login: password check, optional second factor, cookie issuance.

use axum::{
    Extension, Json,
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::debug;

use super::cookies::{csrf_cookie, extract_client_ip, extract_user_agent, session_cookie};
use super::internal_error;
use super::state::AdminState;
use super::storage;
use super::types::{ErrorResponse, LoginRequest, LoginResponse};
use crate::audit::{self, NewAuditEntry};
use crate::auth::{csrf, password, recovery};

/// How the second authentication factor was satisfied, for the audit trail.
enum SecondFactor {
    None,
    Totp,
    RecoveryCode,
}

impl SecondFactor {
    const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Totp => "totp",
            Self::RecoveryCode => "recovery_code",
        }
    }
}

/// Authenticate the admin and establish a session.
///
/// Every failure mode returns the same 401 body; which step failed is
/// recorded only in the audit trail.
#[utoipa::path(
    post,
    path = "/v1/admin/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session established", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
    ),
    tag = "admin"
)]
pub async fn login(
    Extension(state): Extension<Arc<AdminState>>,
    Extension(pool): Extension<PgPool>,
    headers: HeaderMap,
    Json(request): Json<LoginRequest>,
) -> Response {
    if !password::verify(&request.password, state.password_hash()) {
        return deny(&pool, &headers, "bad_password").await;
    }

    let second_factor = if state.two_factor_enabled() {
        match check_second_factor(&state, &pool, &request).await {
            Ok(factor) => factor,
            Err(reason) => return deny(&pool, &headers, reason).await,
        }
    } else {
        SecondFactor::None
    };

    let session = match state.sessions().issue() {
        Ok(session) => session,
        Err(err) => return internal_error(&err),
    };
    let csrf_token = csrf::generate(state.csrf_secret_bytes());

    let mut response_headers = HeaderMap::new();
    let session_value = match session_cookie(state.config(), &session.token) {
        Ok(value) => value,
        Err(err) => return internal_error(&err.into()),
    };
    let csrf_value = match csrf_cookie(state.config(), &csrf_token) {
        Ok(value) => value,
        Err(err) => return internal_error(&err.into()),
    };
    response_headers.append(SET_COOKIE, session_value);
    response_headers.append(SET_COOKIE, csrf_value);

    audit::record(
        &pool,
        NewAuditEntry::new(audit::ACTION_LOGIN)
            .with_ip(extract_client_ip(&headers))
            .with_user_agent(extract_user_agent(&headers))
            .with_metadata(json!({
                "second_factor": second_factor.as_str(),
                "jti": session.claims.jti,
            })),
    )
    .await;

    (
        StatusCode::OK,
        response_headers,
        Json(LoginResponse {
            expires_at: session.claims.exp,
        }),
    )
        .into_response()
}

/// Validate the TOTP code or redeem a recovery code.
///
/// A recovery code is accepted only if the conditional update actually
/// consumed it, so a replayed code loses the race and is denied.
async fn check_second_factor(
    state: &AdminState,
    pool: &PgPool,
    request: &LoginRequest,
) -> Result<SecondFactor, &'static str> {
    if let Some(code) = request
        .totp_code
        .as_deref()
        .map(str::trim)
        .filter(|code| !code.is_empty())
    {
        let Some(totp) = state.totp() else {
            return Err("totp_not_configured");
        };
        if totp.verify(code) {
            return Ok(SecondFactor::Totp);
        }
        return Err("bad_totp_code");
    }

    if let Some(code) = request
        .recovery_code
        .as_deref()
        .map(str::trim)
        .filter(|code| !code.is_empty())
    {
        let hashes = storage::list_unused_code_hashes(pool)
            .await
            .map_err(|_| "recovery_lookup_failed")?;
        let Ok(Some(matched)) = recovery::find_matching_hash(code, &hashes) else {
            return Err("bad_recovery_code");
        };
        let consumed = storage::consume_recovery_code(pool, matched)
            .await
            .map_err(|_| "recovery_consume_failed")?;
        if consumed {
            return Ok(SecondFactor::RecoveryCode);
        }
        return Err("recovery_code_already_used");
    }

    Err("missing_second_factor")
}

/// Audit the failure and return the generic denial.
async fn deny(pool: &PgPool, headers: &HeaderMap, reason: &str) -> Response {
    debug!(reason, "admin login rejected");
    audit::record(
        pool,
        NewAuditEntry::new(audit::ACTION_LOGIN_FAILED)
            .with_ip(extract_client_ip(headers))
            .with_user_agent(extract_user_agent(headers))
            .with_metadata(json!({ "reason": reason })),
    )
    .await;
    invalid_credentials()
}

/// One denial shape for every login failure, so responses do not leak
/// which step rejected the attempt.
fn invalid_credentials() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: "Invalid credentials".to_string(),
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_factor_labels() {
        assert_eq!(SecondFactor::None.as_str(), "none");
        assert_eq!(SecondFactor::Totp.as_str(), "totp");
        assert_eq!(SecondFactor::RecoveryCode.as_str(), "recovery_code");
    }

    #[test]
    fn invalid_credentials_is_401() {
        assert_eq!(invalid_credentials().status(), StatusCode::UNAUTHORIZED);
    }
}
