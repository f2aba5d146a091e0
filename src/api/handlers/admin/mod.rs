//! Admin authentication surface: login, session, recovery codes, audit.

pub mod audit;
pub(crate) mod cookies;
pub mod gate;
pub mod login;
pub mod recovery;
pub mod session;
pub mod state;
pub(crate) mod storage;
pub mod types;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use types::ErrorResponse;

/// Log the underlying error and return an opaque 500.
pub(crate) fn internal_error(err: &anyhow::Error) -> Response {
    error!("admin handler error: {err:#}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "Internal server error".to_string(),
        }),
    )
        .into_response()
}
