//! Cookie assembly and extraction for the admin session and CSRF tokens.

use axum::http::{HeaderMap, HeaderValue, header::InvalidHeaderValue};

use super::state::AdminConfig;

pub(crate) const SESSION_COOKIE_NAME: &str = "admin_session";
pub(crate) const CSRF_COOKIE_NAME: &str = "csrf_token";

/// CSRF cookie lifetime; shorter than the session by design so a parked
/// tab re-fetches a token before mutating anything.
const CSRF_COOKIE_MAX_AGE_SECONDS: i64 = 3600;

/// `HttpOnly` session cookie carrying the signed token.
pub(super) fn session_cookie(
    config: &AdminConfig,
    token: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let max_age = config.session_ttl_seconds();
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Strict; Max-Age={max_age}"
    );
    if config.cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

pub(super) fn clear_session_cookie(config: &AdminConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie =
        format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0");
    if config.cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Readable CSRF cookie for the double-submit check; deliberately not
/// `HttpOnly` so the frontend can echo it in a header.
pub(super) fn csrf_cookie(
    config: &AdminConfig,
    token: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!(
        "{CSRF_COOKIE_NAME}={token}; Path=/; SameSite=Strict; Max-Age={CSRF_COOKIE_MAX_AGE_SECONDS}"
    );
    if config.cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

pub(super) fn clear_csrf_cookie(config: &AdminConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{CSRF_COOKIE_NAME}=; Path=/; SameSite=Strict; Max-Age=0");
    if config.cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Pull a single cookie value out of the `Cookie` request header.
pub(crate) fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let header = headers.get(axum::http::header::COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == name {
            return Some(val.to_string());
        }
    }
    None
}

/// Extract a client IP for audit entries from common proxy headers.
pub(crate) fn extract_client_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if forwarded.is_some() {
        return forwarded.map(str::to_string);
    }
    headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

pub(crate) fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::handlers::admin::state::tests::test_config;

    #[test]
    fn session_cookie_sets_expected_attributes() {
        let cookie = session_cookie(&test_config(), "token-value").unwrap();
        let value = cookie.to_str().unwrap();
        assert!(value.starts_with("admin_session=token-value"));
        assert!(value.contains("HttpOnly"));
        assert!(value.contains("SameSite=Strict"));
        assert!(value.contains("Secure"));
        assert!(value.contains("Max-Age=28800"));
    }

    #[test]
    fn csrf_cookie_is_readable_and_short_lived() {
        let cookie = csrf_cookie(&test_config(), "token-value").unwrap();
        let value = cookie.to_str().unwrap();
        assert!(value.starts_with("csrf_token=token-value"));
        assert!(!value.contains("HttpOnly"));
        assert!(value.contains("Max-Age=3600"));
    }

    #[test]
    fn clear_cookies_zero_max_age() {
        let session = clear_session_cookie(&test_config()).unwrap();
        assert!(session.to_str().unwrap().contains("Max-Age=0"));
        let csrf = clear_csrf_cookie(&test_config()).unwrap();
        assert!(csrf.to_str().unwrap().contains("Max-Age=0"));
    }

    #[test]
    fn extract_cookie_finds_named_value() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_static("other=1; admin_session=abc; csrf_token=def"),
        );
        assert_eq!(
            extract_cookie(&headers, SESSION_COOKIE_NAME).as_deref(),
            Some("abc")
        );
        assert_eq!(
            extract_cookie(&headers, CSRF_COOKIE_NAME).as_deref(),
            Some("def")
        );
        assert!(extract_cookie(&headers, "missing").is_none());
    }

    #[test]
    fn extract_client_ip_prefers_forwarded() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("1.2.3.4, 5.6.7.8"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("9.9.9.9"));
        assert_eq!(extract_client_ip(&headers), Some("1.2.3.4".to_string()));
    }

    #[test]
    fn extract_client_ip_falls_back_to_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("9.9.9.9"));
        assert_eq!(extract_client_ip(&headers), Some("9.9.9.9".to_string()));
    }
}
