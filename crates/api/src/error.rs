//! Error responses.
//!
//! Every failure leaves the API as `{"error": CODE, "message": text}` with
//! the status derived from the error kind.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tally_core::{ErrorKind, LedgerError};
use tally_shared::AppError;
use tracing::error;

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// An error ready to be rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    /// HTTP status of the response.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Stable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }

    fn internal(code: &'static str, detail: &str) -> Self {
        error!(error = %detail, "Request failed with internal error");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code,
            message: "An internal error occurred".to_string(),
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        if err.kind() == ErrorKind::Internal {
            return Self::internal(err.error_code(), &err.to_string());
        }
        Self {
            status: StatusCode::from_u16(err.http_status_code()).unwrap_or(StatusCode::BAD_REQUEST),
            code: err.error_code(),
            message: err.to_string(),
        }
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            return Self::internal(err.error_code(), &err.to_string());
        }
        Self {
            status,
            code: err.error_code(),
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "INVALID_REQUEST",
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({
                "error": self.code,
                "message": self.message
            })),
        )
            .into_response()
    }
}
