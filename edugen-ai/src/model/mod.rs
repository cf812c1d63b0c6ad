//! Model invocation adapter
//!
//! Pipeline code talks to the hosted model only through [`ModelBackend`]
//! and [`OperationBackend`]. Every call receives its credential explicitly;
//! implementations must not retain it.

pub mod gemini;

pub use gemini::{GeminiClient, GeminiConfig};

use crate::credential::Credential;
use crate::error::PipelineError;
use crate::operation::{MediaArtifact, OperationHandle};
use crate::schema::Schema;
use serde_json::Value;
use thiserror::Error;

/// Adapter-level failure, before it is mapped onto the pipeline taxonomy
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// Network fault, throttling or server-side error
    #[error("{0}")]
    Unavailable(String),

    /// The backend refused this request and would refuse it again
    #[error("{0}")]
    Rejected(String),

    /// Key missing, invalid or not permitted
    #[error("{0}")]
    Unauthorized(String),

    /// Response did not have the documented shape
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<BackendError> for PipelineError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Unavailable(msg) => PipelineError::UpstreamUnavailable(msg),
            BackendError::Malformed(msg) => {
                PipelineError::UpstreamUnavailable(format!("malformed response: {}", msg))
            }
            BackendError::Rejected(msg) => PipelineError::UpstreamRejected(msg),
            BackendError::Unauthorized(msg) => {
                PipelineError::Configuration(format!("credential refused: {}", msg))
            }
        }
    }
}

/// Map a non-success HTTP status onto a [`BackendError`]
///
/// Google APIs report an invalid key as `400 INVALID_ARGUMENT` with an
/// "API key not valid" message, so 400 is inspected as well as 401/403.
pub fn classify_status(status: u16, message: String) -> BackendError {
    match status {
        401 | 403 => BackendError::Unauthorized(message),
        400 if message.contains("API key not valid") || message.contains("API_KEY_INVALID") => {
            BackendError::Unauthorized(message)
        }
        408 | 429 => BackendError::Unavailable(format!("HTTP {}: {}", status, message)),
        500..=599 => BackendError::Unavailable(format!("HTTP {}: {}", status, message)),
        _ => BackendError::Rejected(format!("HTTP {}: {}", status, message)),
    }
}

/// One structured-generation call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    /// Task name, for logs only
    pub task: String,
    pub prompt: String,
    /// Shape the model is asked to produce
    pub output: Schema,
}

/// What the backend returned, before parsing and validation
#[derive(Debug, Clone, PartialEq)]
pub enum RawOutput {
    Text(String),
    Json(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpeechRequest {
    pub text: String,
}

/// Raw PCM samples plus the mime type they were labelled with
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechAudio {
    pub pcm: Vec<u8>,
    pub mime_type: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VideoRequest {
    pub prompt: String,
    pub duration_seconds: u32,
    pub aspect_ratio: String,
}

impl VideoRequest {
    /// Five-second 16:9 clip
    pub fn short_clip(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            duration_seconds: 5,
            aspect_ratio: "16:9".to_string(),
        }
    }
}

/// Single-shot model calls
#[async_trait::async_trait]
pub trait ModelBackend: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Generate output shaped like `request.output`
    ///
    /// # Errors
    ///
    /// `BackendError` classified per [`classify_status`]; safety blocks are
    /// `Rejected`.
    async fn generate(
        &self,
        request: &GenerateRequest,
        credential: &Credential,
    ) -> Result<RawOutput, BackendError>;

    /// Text to raw PCM speech
    async fn synthesize_speech(
        &self,
        request: &SpeechRequest,
        credential: &Credential,
    ) -> Result<SpeechAudio, BackendError>;
}

/// Long-running media jobs
#[async_trait::async_trait]
pub trait OperationBackend: Send + Sync {
    /// Start a video job; the returned handle may already be terminal
    async fn submit_video(
        &self,
        request: &VideoRequest,
        credential: &Credential,
    ) -> Result<OperationHandle, BackendError>;

    /// Fetch the current state of a job
    async fn check_operation(
        &self,
        operation_id: &str,
        credential: &Credential,
    ) -> Result<OperationHandle, BackendError>;

    /// Download a finished artifact
    async fn fetch_media(
        &self,
        artifact: &MediaArtifact,
        credential: &Credential,
    ) -> Result<Vec<u8>, BackendError>;
}
