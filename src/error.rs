/// Unified error types for Octavia
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::upstream::FetchError;

/// Main error type for the service
#[derive(Error, Debug)]
pub enum OctaviaError {
    /// Region string not in the known set
    #[error("Invalid region: {region}. Valid regions are: {valid}")]
    InvalidRegion { region: String, valid: String },

    /// Empty or sentinel author identifier
    #[error("Invalid author ID: {0}")]
    InvalidAuthorId(String),

    /// No author record for any candidate uid
    #[error("Author not found: {0}")]
    AuthorNotFound(String),

    /// Stage removed or unpublished upstream
    #[error("Stage not found: {0}")]
    StageNotFound(String),

    /// Network, timeout or non-2xx from the third-party platform
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Request validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Database errors
    #[error("Database error: {0}")]
    Store(#[from] sqlx::Error),

    /// Rate limiting errors
    #[error("Rate limit exceeded")]
    RateLimitExceeded { retry_after: std::time::Duration },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<FetchError> for OctaviaError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::NotFound(msg) => OctaviaError::StageNotFound(msg),
            FetchError::Upstream(msg) => OctaviaError::Upstream(msg),
        }
    }
}

/// JSON error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for OctaviaError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            OctaviaError::InvalidRegion { .. } => (
                StatusCode::BAD_REQUEST,
                "InvalidRegion",
                self.to_string(),
            ),
            OctaviaError::InvalidAuthorId(_) => (
                StatusCode::BAD_REQUEST,
                "InvalidAuthorId",
                self.to_string(),
            ),
            OctaviaError::Validation(_) => (
                StatusCode::BAD_REQUEST,
                "InvalidRequest",
                self.to_string(),
            ),
            OctaviaError::AuthorNotFound(_) => (
                StatusCode::NOT_FOUND,
                "AuthorNotFound",
                self.to_string(),
            ),
            OctaviaError::StageNotFound(_) => (
                StatusCode::NOT_FOUND,
                "StageNotFound",
                self.to_string(),
            ),
            OctaviaError::Upstream(_) => (
                StatusCode::BAD_GATEWAY,
                "UpstreamError",
                self.to_string(),
            ),
            OctaviaError::RateLimitExceeded { .. } => (
                StatusCode::TOO_MANY_REQUESTS,
                "RateLimitExceeded",
                "Rate limit exceeded".to_string(),
            ),
            OctaviaError::Store(_) | OctaviaError::Io(_) | OctaviaError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "InternalServerError",
                "Internal server error".to_string(), // Don't leak details
            ),
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for service operations
pub type OctaviaResult<T> = Result<T, OctaviaError>;
