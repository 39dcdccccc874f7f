//! Error handling module for the onboarding backend.
//!
//! Provides centralized error types with mapping to HTTP status codes and response envelopes.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const NO_DATA: &str = "NO_DATA";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const DUPLICATE_TRAINEE: &str = "DUPLICATE_TRAINEE";
    pub const INVALID_STATE: &str = "INVALID_STATE";
    pub const STORE_UNAVAILABLE: &str = "STORE_UNAVAILABLE";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
}

/// Application error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Authentication required or credentials rejected
    Unauthorized(String),
    /// Resource not found
    NotFound(String),
    /// A query matched nothing worth returning (e.g. an empty report)
    NoData(String),
    /// Empty or malformed input; blocks the requested transition
    Validation(String),
    /// A trainee with this name (case-insensitive) already has a period
    DuplicateTrainee(String),
    /// Workflow step requested out of order
    InvalidState(String),
    /// Storage failure
    StoreUnavailable(String),
    /// Internal server error
    Internal(String),
    /// Bad request
    BadRequest(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::NoData(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::DuplicateTrainee(_) => StatusCode::CONFLICT,
            AppError::InvalidState(_) => StatusCode::CONFLICT,
            AppError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Unauthorized(_) => codes::UNAUTHORIZED,
            AppError::NotFound(_) => codes::NOT_FOUND,
            AppError::NoData(_) => codes::NO_DATA,
            AppError::Validation(_) => codes::VALIDATION_ERROR,
            AppError::DuplicateTrainee(_) => codes::DUPLICATE_TRAINEE,
            AppError::InvalidState(_) => codes::INVALID_STATE,
            AppError::StoreUnavailable(_) => codes::STORE_UNAVAILABLE,
            AppError::Internal(_) => codes::INTERNAL_ERROR,
            AppError::BadRequest(_) => codes::BAD_REQUEST,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> &str {
        match self {
            AppError::Unauthorized(msg)
            | AppError::NotFound(msg)
            | AppError::NoData(msg)
            | AppError::Validation(msg)
            | AppError::DuplicateTrainee(msg)
            | AppError::InvalidState(msg)
            | AppError::StoreUnavailable(msg)
            | AppError::Internal(msg)
            | AppError::BadRequest(msg) => msg,
        }
    }

    pub fn duplicate_trainee(name: &str) -> Self {
        AppError::DuplicateTrainee(format!("Trainee \"{}\" already exists", name))
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        AppError::StoreUnavailable(format!("Database error: {}", err))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected request body: {}", rejection.body_text());
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!("Rejected query string: {}", rejection.body_text());
        AppError::BadRequest(rejection.body_text())
    }
}

/// Error details in the response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

/// Error response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetails,
}

impl ErrorResponse {
    pub fn new(error: &AppError) -> Self {
        Self {
            success: false,
            error: ErrorDetails {
                code: error.error_code().to_string(),
                message: error.message().to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::warn!(code = self.error_code(), "Request failed: {}", self.message());
        }
        (status, Json(ErrorResponse::new(&self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_maps_to_conflict() {
        let err = AppError::duplicate_trainee("Jane");
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.error_code(), codes::DUPLICATE_TRAINEE);
        assert!(err.message().contains("Jane"));
    }

    #[test]
    fn test_store_errors_are_unavailable() {
        let err = AppError::from(sqlx::Error::PoolTimedOut);
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.error_code(), codes::STORE_UNAVAILABLE);
    }

    #[test]
    fn test_no_data_is_not_found_status_with_own_code() {
        let err = AppError::NoData("nothing".to_string());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.error_code(), "NO_DATA");
        assert_eq!(err.to_string(), "NO_DATA: nothing");
    }
}
