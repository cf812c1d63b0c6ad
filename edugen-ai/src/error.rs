//! Error types for edugen-ai
//!
//! [`PipelineError`] is the failure half of every pipeline operation.
//! [`ApiError`] adds the HTTP-only cases and renders `{kind, message}`.

use crate::audio::EncodingError;
use crate::schema::{Origin, ValidationError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use thiserror::Error;

/// Failure taxonomy shared by every surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    ValidationError,
    ConfigurationError,
    UpstreamUnavailable,
    UpstreamRejected,
    /// Some items of a fan-out batch failed; never a top-level error
    PartialFailure,
    TimeoutError,
    EncodingError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ValidationError => "ValidationError",
            ErrorKind::ConfigurationError => "ConfigurationError",
            ErrorKind::UpstreamUnavailable => "UpstreamUnavailable",
            ErrorKind::UpstreamRejected => "UpstreamRejected",
            ErrorKind::PartialFailure => "PartialFailure",
            ErrorKind::TimeoutError => "TimeoutError",
            ErrorKind::EncodingError => "EncodingError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// Input or model output violated its contract
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Missing or refused credential, or a broken service setup
    #[error("{0}")]
    Configuration(String),

    /// Transient backend or network fault
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Backend declined the request (safety block, invalid request, failed job)
    #[error("upstream rejected: {0}")]
    UpstreamRejected(String),

    /// Deadline exceeded or call cancelled
    #[error("{0}")]
    Timeout(String),

    #[error("audio encoding failed: {0}")]
    Encoding(#[from] EncodingError),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Validation(_) => ErrorKind::ValidationError,
            PipelineError::Configuration(_) => ErrorKind::ConfigurationError,
            PipelineError::UpstreamUnavailable(_) => ErrorKind::UpstreamUnavailable,
            PipelineError::UpstreamRejected(_) => ErrorKind::UpstreamRejected,
            PipelineError::Timeout(_) => ErrorKind::TimeoutError,
            PipelineError::Encoding(_) => ErrorKind::EncodingError,
        }
    }

    /// Whether the same call may succeed if simply tried again later
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PipelineError::UpstreamUnavailable(_) | PipelineError::Timeout(_)
        )
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            PipelineError::Validation(e) if e.origin == Origin::Input => StatusCode::BAD_REQUEST,
            PipelineError::Validation(_) => StatusCode::BAD_GATEWAY,
            PipelineError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            PipelineError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            PipelineError::UpstreamRejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PipelineError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            PipelineError::Encoding(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

/// Failure of an HTTP handler
#[derive(Debug, Error)]
pub enum ApiError {
    /// Unknown route parameter, e.g. a task name (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Body is not a JSON object (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NotFound", msg),
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorKind::ValidationError.as_str(),
                msg,
            ),
            ApiError::Pipeline(ref err) => (err.status_code(), err.kind().as_str(), err.to_string()),
        };

        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), kind, "{}", message);
        }

        let body = Json(json!({
            "kind": kind,
            "message": message,
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
