//! HTTP error boundary: every failure renders as `{"error": message}`.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::error::DirectoryError;

#[derive(Debug)]
pub struct AppError(pub DirectoryError);

impl<E> From<E> for AppError
where
    E: Into<DirectoryError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl From<JsonRejection> for DirectoryError {
    fn from(rejection: JsonRejection) -> Self {
        DirectoryError::validation(format!("invalid request body: {}", rejection.body_text()))
    }
}

/// Per-route fallback for unsupported methods, so 405s keep the error body.
pub async fn method_not_allowed() -> AppError {
    AppError(DirectoryError::MethodNotAllowed)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
