//! Media generation flows
//!
//! [`VideoGenerator`] drives a long-running job through the
//! [`OperationPoller`]; [`AudioGenerator`] wraps synthesized PCM in a WAV
//! container. Both return the media inline as a base64 data URI.

use crate::audio::{self, PcmFormat};
use crate::credential::CredentialResolver;
use crate::deadline::Deadline;
use crate::error::PipelineError;
use crate::model::{ModelBackend, OperationBackend, SpeechRequest, VideoRequest};
use crate::operation::{MediaKind, OperationPoller};
use crate::schema::{InputContract, ObjectSchema, Schema};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Budget for one video job unless configured otherwise
pub const DEFAULT_OPERATION_BUDGET: Duration = Duration::from_secs(600);

fn data_uri(content_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", content_type, STANDARD.encode(bytes))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedVideo {
    pub video: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedAudio {
    pub media: String,
}

/// Prompt → short video clip
pub struct VideoGenerator {
    backend: Arc<dyn OperationBackend>,
    credentials: CredentialResolver,
    poller: OperationPoller,
    budget: Duration,
    input: InputContract,
}

impl VideoGenerator {
    pub fn new(
        backend: Arc<dyn OperationBackend>,
        credentials: CredentialResolver,
        poller: OperationPoller,
    ) -> Self {
        Self {
            backend,
            credentials,
            poller,
            budget: DEFAULT_OPERATION_BUDGET,
            input: InputContract::new(ObjectSchema::new().required("prompt", Schema::String)),
        }
    }

    /// Cap on submit + polling + download, applied inside the caller's deadline
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    /// Generate a video for `{prompt, apiKey?}`
    ///
    /// # Errors
    ///
    /// Input `ValidationError`, `ConfigurationError` without a credential,
    /// then any submit, poll or download failure. A job that reports an
    /// error is `UpstreamRejected` and is not resubmitted.
    pub async fn generate(&self, raw: Value, deadline: &Deadline) -> Result<GeneratedVideo, PipelineError> {
        let input = self.input.validate(raw)?;
        let credential = self.credentials.resolve(input.credential())?;
        let prompt = input.get_str("prompt").unwrap_or_default();
        let deadline = deadline.tightened(self.budget);

        let request = VideoRequest::short_clip(prompt);
        let handle = deadline
            .run("video submission", async {
                self.backend
                    .submit_video(&request, &credential)
                    .await
                    .map_err(PipelineError::from)
            })
            .await?;
        info!(operation = %handle.id, "Video job submitted");

        let polled = self
            .poller
            .await_artifact(self.backend.as_ref(), handle, &credential, MediaKind::Video, &deadline)
            .await?;

        let bytes = deadline
            .run("video download", async {
                self.backend
                    .fetch_media(&polled.artifact, &credential)
                    .await
                    .map_err(PipelineError::from)
            })
            .await?;

        info!(
            operation = %polled.operation_id,
            bytes = bytes.len(),
            wait_cycles = polled.wait_cycles,
            "Video ready"
        );
        Ok(GeneratedVideo {
            video: data_uri(&polled.artifact.content_type, &bytes),
        })
    }
}

/// Text → spoken WAV audio
pub struct AudioGenerator {
    backend: Arc<dyn ModelBackend>,
    credentials: CredentialResolver,
    input: InputContract,
}

impl AudioGenerator {
    pub fn new(backend: Arc<dyn ModelBackend>, credentials: CredentialResolver) -> Self {
        Self {
            backend,
            credentials,
            input: InputContract::new(ObjectSchema::new().required("text", Schema::String)),
        }
    }

    /// Synthesize `{text, apiKey?}` and wrap the PCM as mono 16-bit WAV
    ///
    /// The sample rate comes from the PCM mime type.
    pub async fn generate(&self, raw: Value, deadline: &Deadline) -> Result<GeneratedAudio, PipelineError> {
        let input = self.input.validate(raw)?;
        let credential = self.credentials.resolve(input.credential())?;
        let request = SpeechRequest {
            text: input.get_str("text").unwrap_or_default().to_string(),
        };

        let speech = deadline
            .run("speech synthesis", async {
                self.backend
                    .synthesize_speech(&request, &credential)
                    .await
                    .map_err(PipelineError::from)
            })
            .await?;

        let format = PcmFormat::mono_16(audio::sample_rate_from_mime(&speech.mime_type));
        let wav = audio::encode(&speech.pcm, format)?;
        info!(
            sample_rate = format.sample_rate,
            data_bytes = wav.data_size(),
            "Speech encoded as WAV"
        );
        Ok(GeneratedAudio {
            media: wav.to_data_uri(),
        })
    }
}
