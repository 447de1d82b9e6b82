//! # REST Errors
//!
//! Maps pipeline errors onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::core::error::CmsError;
use crate::schema::FieldError;

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
    pub status: u16,
    /// Field errors for validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

impl From<&CmsError> for ErrorResponse {
    fn from(err: &CmsError) -> Self {
        let details = match err {
            CmsError::Validation(v) => Some(v.errors.clone()),
            _ => None,
        };
        Self {
            error: err.to_string(),
            code: err.code(),
            status: err.status_code(),
            details,
        }
    }
}

impl IntoResponse for CmsError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "request failed");
        }
        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}
