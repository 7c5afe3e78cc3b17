//! API error handling for the Cloudstore HTTP surface.
//!
//! Every error body has the shape `{"message": <text>, "id": <status>}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::CloudStoreError;

/// Message returned when no valid identity is attached to a request.
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized error";

/// Message returned when a request body exceeds the transport limit.
pub const PAYLOAD_TOO_LARGE_MESSAGE: &str = "Request body too large";

/// API error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Bad request (400).
    BadRequest,
    /// Unauthorized (401).
    Unauthorized,
    /// Payload too large (413).
    PayloadTooLarge,
    /// Internal server error (500).
    InternalError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// API error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Human-readable message.
    pub message: String,
    /// Numeric status code.
    pub id: u16,
}

/// API error type.
#[derive(Debug)]
pub struct ApiError {
    code: ErrorCode,
    message: String,
}

impl ApiError {
    /// Create a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Create a bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    /// Create an unauthorized error.
    pub fn unauthorized() -> Self {
        Self::new(ErrorCode::Unauthorized, UNAUTHORIZED_MESSAGE)
    }

    /// Create a payload-too-large error.
    pub fn payload_too_large() -> Self {
        Self::new(ErrorCode::PayloadTooLarge, PAYLOAD_TOO_LARGE_MESSAGE)
    }

    /// Create an internal server error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Convert a service error, using `internal_message` for server faults.
    ///
    /// Client faults keep their own message; the cause of a server fault is
    /// logged and not returned.
    pub fn from_error(err: CloudStoreError, internal_message: &str) -> Self {
        match err {
            CloudStoreError::Unauthenticated => ApiError::unauthorized(),
            ref e if e.is_client_error() => ApiError::bad_request(e.to_string()),
            e => {
                tracing::error!(error = %e, "{}", internal_message);
                ApiError::internal(internal_message)
            }
        }
    }

    /// Create a bad request error from validator::ValidationErrors.
    pub fn from_validation_errors(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, field_errors)| {
                field_errors.iter().map(move |e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value for {field}"))
                })
            })
            .collect();
        messages.sort();

        Self::bad_request(messages.join("; "))
    }

    /// Error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.code.status_code();
        let body = ErrorBody {
            message: self.message,
            id: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<CloudStoreError> for ApiError {
    fn from(err: CloudStoreError) -> Self {
        ApiError::from_error(err, "An internal error occurred")
    }
}
