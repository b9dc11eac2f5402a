//! HTTP Error Types
//!
//! Maps application errors to HTTP status codes. Engine outcomes never reach
//! this module: they are 200 responses carrying an `error` field.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use jqlite_core::error::AppError;
use thiserror::Error;
use tracing::{error, warn};

use crate::types::ErrorBody;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or empty required fields
    #[error("{0}")]
    Validation(String),

    /// Body could not be decoded as the expected JSON shape
    #[error("Invalid request body: {message}")]
    InvalidBody { status: StatusCode, message: String },

    /// Unexpected failure while preparing or cleaning up
    #[error("Server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidBody { status, .. } => *status,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Domain(e) => ApiError::Validation(e.to_string()),
            AppError::Store(e) => ApiError::Internal(e.to_string()),
            AppError::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        // Oversized bodies keep 413; every other decoding problem is a bad request
        let status = match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        };
        ApiError::InvalidBody {
            status,
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            error!(error = %self, "Request failed with server error");
        } else {
            warn!(error = %self, "Rejected request");
        }

        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
