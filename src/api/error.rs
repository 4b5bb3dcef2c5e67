//! API Error Types
//!
//! Defines error types for the API layer and implements conversion
//! to HTTP responses with appropriate status codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::store::StoreError;

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request validation failed
    #[error("{0}")]
    Validation(String),

    /// Caller identity missing or malformed
    #[error("{0}")]
    Unauthorized(String),

    /// Resource not found
    #[error("{0}")]
    NotFound(String),

    /// A record for this user and date already exists
    #[error("{0}")]
    Duplicate(String),

    /// Record store error
    #[error("Storage error: {0}")]
    Storage(StoreError),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            StoreError::Duplicate { kind, .. } => {
                ApiError::Duplicate(format!("A {kind} for this date already exists."))
            }
            StoreError::InvalidData(msg) => ApiError::Validation(msg),
            other => ApiError::Storage(other),
        }
    }
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
    pub request_id: String,
}

/// Error details
#[derive(Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ApiError {
    /// HTTP status and machine-readable code
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Duplicate(_) => (StatusCode::CONFLICT, "DUPLICATE_DATE"),
            ApiError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let request_id = uuid::Uuid::new_v4().to_string();

        if status.is_server_error() {
            tracing::error!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "API error occurred"
            );
        } else {
            tracing::debug!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "Request rejected"
            );
        }

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: self.to_string(),
            },
            request_id,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_store_error_mapping() {
        let dup = StoreError::Duplicate {
            kind: "health log",
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        };
        let err = ApiError::from(dup);
        assert_eq!(err.status_and_code(), (StatusCode::CONFLICT, "DUPLICATE_DATE"));
        assert_eq!(err.to_string(), "A health log for this date already exists.");

        let err = ApiError::from(StoreError::not_found("meal", 3));
        assert_eq!(err.status_and_code().0, StatusCode::NOT_FOUND);

        let err = ApiError::from(StoreError::InvalidData("food 9 is not available".into()));
        assert_eq!(err.status_and_code().0, StatusCode::BAD_REQUEST);

        let err = ApiError::from(StoreError::Lock("poisoned".into()));
        assert_eq!(err.status_and_code().0, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_into_response_status() {
        let response = ApiError::Unauthorized("missing".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
