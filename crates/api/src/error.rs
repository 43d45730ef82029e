//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::CommerceError;

/// API-level error type that maps to HTTP responses.
///
/// Every failure body has the shape `{error, message, data: null}` where
/// `error` is the machine-readable kind and `message` the human-readable
/// text, matching the success envelope in [`crate::routes`].
#[derive(Debug)]
pub enum ApiError {
    /// Malformed request (bad path/header/body before reaching the domain).
    BadRequest(String),
    /// Domain operation failure.
    Commerce(CommerceError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::Commerce(err) => commerce_error_to_response(err),
        };

        let body = serde_json::json!({
            "error": kind,
            "message": message,
            "data": null,
        });
        (status, axum::Json(body)).into_response()
    }
}

fn commerce_error_to_response(err: CommerceError) -> (StatusCode, &'static str, String) {
    match err {
        CommerceError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
        CommerceError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
        err @ CommerceError::Unauthorized => {
            (StatusCode::UNAUTHORIZED, "unauthorized", err.to_string())
        }
        err @ CommerceError::Forbidden => (StatusCode::FORBIDDEN, "forbidden", err.to_string()),
        CommerceError::Store(store_err) => {
            tracing::error!(error = %store_err, "internal server error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                "internal server error".to_string(),
            )
        }
    }
}

impl From<CommerceError> for ApiError {
    fn from(err: CommerceError) -> Self {
        ApiError::Commerce(err)
    }
}
