use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use nn_core::Error;

/// Maps core errors onto HTTP statuses with a `{"error": ...}` body.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            Error::NoArticles
            | Error::NotNews(_)
            | Error::InsufficientSources { .. }
            | Error::InvalidUrl(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Scraping(_) | Error::Upstream(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        }
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}
