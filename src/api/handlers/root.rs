use axum::{http::StatusCode, response::IntoResponse};

/// Undocumented liveness probe; the real health detail lives at `/health`.
pub async fn root() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[tokio::test]
    async fn root_returns_no_content() {
        let response = root().await.into_response();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }
}
