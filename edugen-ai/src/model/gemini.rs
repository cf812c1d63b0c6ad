//! Gemini REST client
//!
//! Implements [`ModelBackend`] and [`OperationBackend`] over the public
//! `generativelanguage` v1beta API. The key travels in the
//! `x-goog-api-key` header of each request and is never stored.

use super::{
    classify_status, BackendError, GenerateRequest, ModelBackend, OperationBackend, RawOutput,
    SpeechAudio, SpeechRequest, VideoRequest,
};
use crate::credential::Credential;
use crate::operation::{MediaArtifact, OperationHandle, OperationStatus};
use crate::schema::Schema;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

const USER_AGENT: &str = concat!("edugen-ai/", env!("CARGO_PKG_VERSION"));
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Finish reasons meaning the model refused to answer
const BLOCKING_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "RECITATION",
    "BLOCKLIST",
    "PROHIBITED_CONTENT",
    "SPII",
];

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub base_url: String,
    pub text_model: String,
    pub speech_model: String,
    pub video_model: String,
    pub voice: String,
    /// Per-HTTP-request ceiling, independent of the caller's deadline
    pub http_timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        let models = edugen_common::config::ModelConfig::default();
        Self {
            base_url: models.api_base_url,
            text_model: models.text_model,
            speech_model: models.speech_model,
            video_model: models.video_model,
            voice: models.voice,
            http_timeout: Duration::from_secs(120),
        }
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationResponse {
    name: String,
    #[serde(default)]
    done: bool,
    error: Option<ErrorBody>,
    response: Option<OperationResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationResult {
    generate_video_response: Option<GenerateVideoResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateVideoResponse {
    #[serde(default)]
    generated_samples: Vec<GeneratedSample>,
}

#[derive(Debug, Deserialize)]
struct GeneratedSample {
    video: Option<VideoRef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoRef {
    uri: Option<String>,
    mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    code: Option<i64>,
}

impl GenerateContentResponse {
    /// Refusals surface as a prompt block or a blocking finish reason
    fn refusal(&self) -> Option<String> {
        if let Some(reason) = self.prompt_feedback.as_ref().and_then(|f| f.block_reason.as_ref()) {
            return Some(format!("prompt blocked ({})", reason));
        }
        self.candidates
            .first()
            .and_then(|c| c.finish_reason.as_deref())
            .filter(|reason| BLOCKING_FINISH_REASONS.contains(reason))
            .map(|reason| format!("response withheld ({})", reason))
    }

    fn parts(&self) -> Result<&[Part], BackendError> {
        if let Some(refusal) = self.refusal() {
            return Err(BackendError::Rejected(refusal));
        }
        let candidate = self
            .candidates
            .first()
            .ok_or_else(|| BackendError::Malformed("no candidates".to_string()))?;
        Ok(candidate
            .content
            .as_ref()
            .map(|c| c.parts.as_slice())
            .unwrap_or_default())
    }
}

impl From<OperationResponse> for OperationHandle {
    fn from(op: OperationResponse) -> Self {
        let status = if let Some(error) = op.error {
            let message = if error.message.is_empty() {
                format!("operation failed with code {}", error.code.unwrap_or_default())
            } else {
                error.message
            };
            OperationStatus::Failed(message)
        } else if !op.done {
            OperationStatus::Pending
        } else {
            let artifacts = op
                .response
                .and_then(|r| r.generate_video_response)
                .map(|r| r.generated_samples)
                .unwrap_or_default()
                .into_iter()
                .filter_map(|sample| sample.video)
                .filter_map(|video| {
                    Some(MediaArtifact {
                        uri: video.uri?,
                        // Veo omits the type on mp4 output
                        content_type: video.mime_type.unwrap_or_else(|| "video/mp4".to_string()),
                    })
                })
                .collect();
            OperationStatus::Done(artifacts)
        };

        OperationHandle {
            id: op.name,
            status,
        }
    }
}

/// Convert a contract into the OpenAPI subset Gemini accepts as `responseSchema`
///
/// Starts from the contract's JSON Schema, then upper-cases type names,
/// drops the keywords Gemini rejects and pins the field order.
pub fn response_schema(schema: &Schema) -> Value {
    let mut converted = schema.to_json_schema();
    to_gemini_dialect(schema, &mut converted);
    converted
}

fn to_gemini_dialect(schema: &Schema, node: &mut Value) {
    let Value::Object(node) = node else {
        return;
    };
    node.remove("additionalProperties");
    node.remove("default");
    if let Some(Value::String(kind)) = node.get_mut("type") {
        *kind = kind.to_uppercase();
    }

    match schema {
        Schema::Enum(_) => {
            node.insert("format".to_string(), json!("enum"));
        }
        Schema::Array(item) => {
            if let Some(items) = node.get_mut("items") {
                to_gemini_dialect(item, items);
            }
        }
        Schema::Object(object) => {
            let ordering: Vec<&str> = object.fields().iter().map(|f| f.name.as_str()).collect();
            if let Some(Value::Object(properties)) = node.get_mut("properties") {
                for field in object.fields() {
                    if let Some(property) = properties.get_mut(&field.name) {
                        to_gemini_dialect(&field.schema, property);
                    }
                }
            }
            node.insert("propertyOrdering".to_string(), json!(ordering));
        }
        _ => {}
    }
}

// ============================================================================
// Client
// ============================================================================

pub struct GeminiClient {
    http: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| BackendError::Unavailable(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!(
            "{}/v1beta/models/{}:{}",
            self.config.base_url.trim_end_matches('/'),
            model,
            method
        )
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        url: &str,
        body: &Value,
        credential: &Credential,
    ) -> Result<T, BackendError> {
        let response = self
            .http
            .post(url)
            .header(API_KEY_HEADER, credential.expose())
            .json(body)
            .send()
            .await
            .map_err(network_error)?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, BackendError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(classify_status(status.as_u16(), error_message(&body)));
    }
    response
        .json::<T>()
        .await
        .map_err(|e| BackendError::Malformed(e.to_string()))
}

fn network_error(e: reqwest::Error) -> BackendError {
    if e.is_timeout() {
        BackendError::Unavailable("request to model backend timed out".to_string())
    } else {
        BackendError::Unavailable(format!("network error: {}", e))
    }
}

/// Google error envelopes carry a readable `error.message`
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.chars().take(200).collect())
}

#[async_trait::async_trait]
impl ModelBackend for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(
        &self,
        request: &GenerateRequest,
        credential: &Credential,
    ) -> Result<RawOutput, BackendError> {
        let mut body = json!({
            "contents": [{"role": "user", "parts": [{"text": request.prompt}]}],
        });
        if request.output != Schema::String {
            body["generationConfig"] = json!({
                "responseMimeType": "application/json",
                "responseSchema": response_schema(&request.output),
            });
        }

        tracing::debug!(
            task = %request.task,
            model = %self.config.text_model,
            prompt_chars = request.prompt.len(),
            "Calling generateContent"
        );

        let url = self.model_url(&self.config.text_model, "generateContent");
        let response: GenerateContentResponse = self.post_json(&url, &body, credential).await?;
        let text: String = response
            .parts()?
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();

        Ok(RawOutput::Text(text))
    }

    async fn synthesize_speech(
        &self,
        request: &SpeechRequest,
        credential: &Credential,
    ) -> Result<SpeechAudio, BackendError> {
        let body = json!({
            "contents": [{"parts": [{"text": request.text}]}],
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": {"prebuiltVoiceConfig": {"voiceName": self.config.voice}}
                }
            }
        });

        let url = self.model_url(&self.config.speech_model, "generateContent");
        let response: GenerateContentResponse = self.post_json(&url, &body, credential).await?;
        let inline = response
            .parts()?
            .iter()
            .find_map(|part| part.inline_data.as_ref())
            .ok_or_else(|| BackendError::Malformed("no audio data in speech response".to_string()))?;

        let pcm = base64::engine::general_purpose::STANDARD
            .decode(inline.data.as_bytes())
            .map_err(|e| BackendError::Malformed(format!("audio payload is not base64: {}", e)))?;

        tracing::debug!(
            mime_type = %inline.mime_type,
            bytes = pcm.len(),
            "Received synthesized speech"
        );

        Ok(SpeechAudio {
            pcm,
            mime_type: inline.mime_type.clone(),
        })
    }
}

#[async_trait::async_trait]
impl OperationBackend for GeminiClient {
    async fn submit_video(
        &self,
        request: &VideoRequest,
        credential: &Credential,
    ) -> Result<OperationHandle, BackendError> {
        let body = json!({
            "instances": [{"prompt": request.prompt}],
            "parameters": {
                "durationSeconds": request.duration_seconds,
                "aspectRatio": request.aspect_ratio,
            }
        });

        let url = self.model_url(&self.config.video_model, "predictLongRunning");
        let operation: OperationResponse = self.post_json(&url, &body, credential).await?;
        tracing::info!(operation = %operation.name, "Video generation submitted");
        Ok(operation.into())
    }

    async fn check_operation(
        &self,
        operation_id: &str,
        credential: &Credential,
    ) -> Result<OperationHandle, BackendError> {
        let url = format!(
            "{}/v1beta/{}",
            self.config.base_url.trim_end_matches('/'),
            operation_id.trim_start_matches('/')
        );
        let response = self
            .http
            .get(&url)
            .header(API_KEY_HEADER, credential.expose())
            .send()
            .await
            .map_err(network_error)?;
        let operation: OperationResponse = decode(response).await?;
        Ok(operation.into())
    }

    async fn fetch_media(
        &self,
        artifact: &MediaArtifact,
        credential: &Credential,
    ) -> Result<Vec<u8>, BackendError> {
        let response = self
            .http
            .get(&artifact.uri)
            .header(API_KEY_HEADER, credential.expose())
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status.as_u16(), error_message(&body)));
        }

        let bytes = response.bytes().await.map_err(network_error)?;
        tracing::debug!(bytes = bytes.len(), content_type = %artifact.content_type, "Downloaded media");
        Ok(bytes.to_vec())
    }
}
