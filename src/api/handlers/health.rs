use crate::GIT_COMMIT_HASH;
use crate::api::handlers::admin::state::AdminState;
use crate::auth::password;
use axum::{
    body::Body,
    extract::Extension,
    http::{HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use sqlx::{Connection, PgPool};
use std::sync::Arc;
use tracing::{Instrument, debug, error, info_span};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Health {
    commit: String,
    name: String,
    version: String,
    database: String,
    password_hash: String,
    jwt_secret: String,
    csrf_secret: String,
    two_factor: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CheckStatus {
    Ok,
    Error,
    Disabled,
}

impl CheckStatus {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
            Self::Disabled => "disabled",
        }
    }

    const fn is_healthy(self) -> bool {
        !matches!(self, Self::Error)
    }
}

#[utoipa::path(
    get,
    path= "/health",
    responses (
        (status = 200, description = "Database and admin configuration are healthy", body = [Health]),
        (status = 503, description = "Database or admin configuration is unhealthy", body = [Health])
    ),
    tag= "health"
)]
// axum handler for health
pub async fn health(
    method: Method,
    pool: Extension<PgPool>,
    state: Extension<Arc<AdminState>>,
) -> impl IntoResponse {
    let database = database_status(&pool.0).await;
    let password_hash = password_hash_status(&state.0);
    let jwt_secret = jwt_secret_status(&state.0);
    let csrf_secret = csrf_secret_status(&state.0);
    let two_factor = two_factor_status(&state.0);

    let is_healthy = database.is_healthy()
        && password_hash.is_healthy()
        && jwt_secret.is_healthy()
        && csrf_secret.is_healthy()
        && two_factor.is_healthy();

    let health = Health {
        commit: GIT_COMMIT_HASH.to_string(),
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.as_str().to_string(),
        password_hash: password_hash.as_str().to_string(),
        jwt_secret: jwt_secret.as_str().to_string(),
        csrf_secret: csrf_secret.as_str().to_string(),
        two_factor: two_factor.as_str().to_string(),
    };

    let body = if method == Method::GET {
        Json(&health).into_response()
    } else {
        Body::empty().into_response()
    };

    let short_hash = if health.commit.len() > 7 {
        &health.commit[0..7]
    } else {
        ""
    };

    let headers = format!("{}:{}:{}", health.name, health.version, short_hash)
        .parse::<HeaderValue>()
        .map(|x_app_header_value| {
            debug!("X-App header: {:?}", x_app_header_value);

            let mut headers = HeaderMap::new();

            headers.insert("X-App", x_app_header_value);

            headers
        })
        .map_err(|err| {
            error!("Failed to parse X-App header: {}", err);
        });

    let headers = headers.unwrap_or_else(|()| HeaderMap::new());

    if is_healthy {
        (StatusCode::OK, headers, body)
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, headers, body)
    }
}

/// Acquire a connection and ping it.
async fn database_status(pool: &PgPool) -> CheckStatus {
    let acquire_span = info_span!(
        "db.acquire",
        db.system = "postgresql",
        db.operation = "ACQUIRE"
    );
    match pool.acquire().instrument(acquire_span).await {
        Ok(mut conn) => {
            let ping_span = info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
            match conn.ping().instrument(ping_span).await {
                Ok(()) => CheckStatus::Ok,
                Err(error) => {
                    error!("Failed to ping database: {}", error);

                    CheckStatus::Error
                }
            }
        }

        Err(error) => {
            error!("Failed to acquire database connection: {}", error);

            CheckStatus::Error
        }
    }
}

/// The configured admin password hash must parse as a bcrypt hash, or no
/// login can ever succeed.
fn password_hash_status(state: &AdminState) -> CheckStatus {
    if password::is_bcrypt_hash(state.password_hash()) {
        CheckStatus::Ok
    } else {
        error!("ADMIN_PASSWORD_HASH is not a valid bcrypt hash");
        CheckStatus::Error
    }
}

/// Length floors are enforced again at startup; the checks stay on the
/// health surface so a bad secret rotation shows up per-check.
fn jwt_secret_status(state: &AdminState) -> CheckStatus {
    if state.jwt_secret_meets_minimum() {
        CheckStatus::Ok
    } else {
        error!("ADMIN_JWT_SECRET is shorter than the required minimum");
        CheckStatus::Error
    }
}

fn csrf_secret_status(state: &AdminState) -> CheckStatus {
    if state.csrf_secret_meets_minimum() {
        CheckStatus::Ok
    } else {
        error!("CSRF_SECRET is shorter than the required minimum");
        CheckStatus::Error
    }
}

/// The TOTP secret is validated at startup, so here it only distinguishes
/// enabled from disabled.
fn two_factor_status(state: &AdminState) -> CheckStatus {
    if state.two_factor_enabled() {
        CheckStatus::Ok
    } else {
        CheckStatus::Disabled
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::handlers::admin::state::tests::test_config;

    #[test]
    fn check_status_labels() {
        assert_eq!(CheckStatus::Ok.as_str(), "ok");
        assert_eq!(CheckStatus::Error.as_str(), "error");
        assert_eq!(CheckStatus::Disabled.as_str(), "disabled");
    }

    #[test]
    fn disabled_two_factor_is_still_healthy() {
        assert!(CheckStatus::Disabled.is_healthy());
        assert!(!CheckStatus::Error.is_healthy());
    }

    #[test]
    fn password_hash_check_accepts_bcrypt() {
        let state = AdminState::new(test_config()).unwrap();
        assert_eq!(password_hash_status(&state), CheckStatus::Ok);
    }

    #[test]
    fn secret_length_checks_pass_for_valid_state() {
        let state = AdminState::new(test_config()).unwrap();
        assert_eq!(jwt_secret_status(&state), CheckStatus::Ok);
        assert_eq!(csrf_secret_status(&state), CheckStatus::Ok);
    }

    #[test]
    fn password_hash_check_rejects_plaintext() {
        let config = crate::api::handlers::admin::state::AdminConfig::new(
            "https://zodia.app".to_string(),
            "not-a-bcrypt-hash".to_string(),
            secrecy::SecretString::from("test-admin-jwt-secret-value"),
            secrecy::SecretString::from("test-csrf-secret-value-here"),
        );
        let state = AdminState::new(config).unwrap();
        assert_eq!(password_hash_status(&state), CheckStatus::Error);
    }
}
