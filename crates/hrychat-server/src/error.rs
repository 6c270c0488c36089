//! HTTP mapping for service errors.
//!
//! Client errors expose their message. Internal errors are logged in full and
//! answered with a generic message.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use hrychat_core::Error;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub Error);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            Error::NotFound(m) => (StatusCode::NOT_FOUND, format!("Not found: {}", m)),
            Error::Validation(m) => (StatusCode::UNPROCESSABLE_ENTITY, m.clone()),
            Error::Provider(m) => {
                warn!(error = %m, "provider failure");
                (StatusCode::BAD_GATEWAY, m.clone())
            }
            Error::Config(_) | Error::Io(_) | Error::Json(_) | Error::Internal(_) => {
                error!(error = %self.0, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Malformed or mistyped request bodies get the same JSON error shape.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(Error::Validation(rejection.body_text()))
    }
}
