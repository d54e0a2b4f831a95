//! Error types for nfo-editor
//!
//! `BatchError` covers structural batch failures; per-file failures never
//! reach it. `ApiError` maps every layer's errors onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::path::PathBuf;
use thiserror::Error;

use crate::codec::CodecError;
use crate::models::{TaskStatus, UnknownLiteral};
use crate::services::file_scanner::ScanError;
use crate::services::task_store::CapacityError;
use crate::validation::ValidationError;

/// Structural batch failures, raised before any file is touched
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Depth ceiling hit or unreadable root
    #[error(transparent)]
    Scan(ScanError),

    #[error("Too many files ({found}). Maximum allowed: {max}")]
    TooManyFiles { found: usize, max: usize },

    #[error(transparent)]
    TooManyTasks(#[from] CapacityError),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Task {task_id} already {status}")]
    TaskAlreadyStarted { task_id: String, status: &'static str },

    #[error("Field 'studio' does not support append mode")]
    UnsupportedMode,

    #[error("Worker pool error: {0}")]
    WorkerPool(String),
}

impl From<ScanError> for BatchError {
    fn from(err: ScanError) -> Self {
        match err {
            ScanError::PathNotFound(path) => BatchError::DirectoryNotFound(path),
            ScanError::NotADirectory(path) => BatchError::NotADirectory(path),
            other => BatchError::Scan(other),
        }
    }
}

impl BatchError {
    pub(crate) fn already_started(task_id: &str, status: TaskStatus) -> Self {
        BatchError::TaskAlreadyStarted {
            task_id: task_id.to_string(),
            status: status.as_str(),
        }
    }
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Path outside the browse root (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Conflict (409) - e.g., task already applied
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Batch too large (413)
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Task registry full (429)
    #[error("Too many requests: {0}")]
    TooManyRequests(String),

    /// Record failed validation (422)
    #[error("Unprocessable: {0}")]
    Unprocessable(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<BatchError> for ApiError {
    fn from(err: BatchError) -> Self {
        let message = err.to_string();
        match err {
            BatchError::DirectoryNotFound(_) | BatchError::TaskNotFound(_) => {
                ApiError::NotFound(message)
            }
            BatchError::NotADirectory(_) | BatchError::UnsupportedMode => {
                ApiError::BadRequest(message)
            }
            BatchError::Scan(ScanError::DepthExceeded { .. }) => ApiError::BadRequest(message),
            BatchError::Scan(ScanError::PermissionDenied(_)) => ApiError::Forbidden(message),
            BatchError::Scan(_) => ApiError::Internal(message),
            BatchError::TooManyFiles { .. } => ApiError::PayloadTooLarge(message),
            BatchError::TooManyTasks(_) => ApiError::TooManyRequests(message),
            BatchError::TaskAlreadyStarted { .. } => ApiError::Conflict(message),
            BatchError::WorkerPool(_) => ApiError::Internal(message),
        }
    }
}

impl From<ScanError> for ApiError {
    fn from(err: ScanError) -> Self {
        match err {
            ScanError::PermissionDenied(_) => ApiError::Forbidden(err.to_string()),
            other => BatchError::from(other).into(),
        }
    }
}

impl From<CodecError> for ApiError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Parse(e) => ApiError::BadRequest(e.to_string()),
            CodecError::File { message, path } if !path.exists() => ApiError::NotFound(message),
            CodecError::File { message, .. } => ApiError::Internal(message),
        }
    }
}

impl From<UnknownLiteral> for ApiError {
    fn from(err: UnknownLiteral) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Unprocessable(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "TOO_MANY_FILES", msg)
            }
            ApiError::TooManyRequests(msg) => {
                (StatusCode::TOO_MANY_REQUESTS, "TOO_MANY_TASKS", msg)
            }
            ApiError::Unprocessable(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_FAILED", msg)
            }
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg,
            ),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
