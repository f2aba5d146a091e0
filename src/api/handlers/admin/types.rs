//! Request/response types for admin endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub password: String,
    /// Current 6-digit TOTP code, when 2FA is enabled.
    #[serde(default)]
    pub totp_code: Option<String>,
    /// One-time recovery code, accepted in place of a TOTP code.
    #[serde(default)]
    pub recovery_code: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    pub expires_at: i64,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SessionStatusResponse {
    pub issued_at: i64,
    pub expires_at: i64,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RecoveryCodesStatusResponse {
    pub remaining: i64,
    pub total: i64,
    pub two_factor_enabled: bool,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RecoveryCodesGeneratedResponse {
    /// Plaintext codes, shown exactly once. Only hashes are stored.
    pub codes: Vec<String>,
    pub remaining: i64,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(IntoParams, Deserialize, Debug, Default)]
#[into_params(parameter_in = Query)]
pub struct AuditLogsQuery {
    /// Restrict to a single action label.
    pub action: Option<String>,
    /// 1-based page number.
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(IntoParams, Deserialize, Debug, Default)]
#[into_params(parameter_in = Query)]
pub struct AuditStatsQuery {
    /// Trailing window in days (default 30, capped at 365).
    pub days: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_request_optional_factors_default_to_none() {
        let request: LoginRequest =
            serde_json::from_str(r#"{"password": "hunter2hunter2"}"#).unwrap();
        assert_eq!(request.password, "hunter2hunter2");
        assert!(request.totp_code.is_none());
        assert!(request.recovery_code.is_none());
    }

    #[test]
    fn login_request_accepts_either_factor() {
        let request: LoginRequest = serde_json::from_str(
            r#"{"password": "p", "totp_code": "123456", "recovery_code": "ABCD-EFGH-JKLM"}"#,
        )
        .unwrap();
        assert_eq!(request.totp_code.as_deref(), Some("123456"));
        assert_eq!(request.recovery_code.as_deref(), Some("ABCD-EFGH-JKLM"));
    }

    #[test]
    fn error_response_serializes_error_field() {
        let value = serde_json::to_value(ErrorResponse {
            error: "Unauthorized".to_string(),
        })
        .unwrap();
        assert_eq!(value["error"], "Unauthorized");
    }
}
