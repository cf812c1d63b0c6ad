//! Scripted stand-ins for the model, operation and search backends
//!
//! Each records what it was asked so tests can assert on calls made (or
//! not made) and on the credential that was used.

use async_trait::async_trait;
use edugen_ai::credential::Credential;
use edugen_ai::enrich::{SearchBackend, SearchCandidate};
use edugen_ai::model::{
    BackendError, GenerateRequest, ModelBackend, OperationBackend, RawOutput, SpeechAudio,
    SpeechRequest, VideoRequest,
};
use edugen_ai::operation::{MediaArtifact, OperationHandle, OperationStatus};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// A call as the backend saw it
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub task: String,
    pub prompt: String,
    pub credential: String,
}

/// Model whose answers are chosen by prompt content, then by queue order
pub struct ScriptedModel {
    rules: Vec<(String, Result<RawOutput, BackendError>)>,
    queue: Mutex<VecDeque<Result<RawOutput, BackendError>>>,
    speech: Option<Result<SpeechAudio, BackendError>>,
    delay: Option<Duration>,
    calls: Mutex<Vec<RecordedCall>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            queue: Mutex::new(VecDeque::new()),
            speech: None,
            delay: None,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Answer every prompt containing `needle` with `result`
    pub fn when_prompt_contains(mut self, needle: &str, result: Result<RawOutput, BackendError>) -> Self {
        self.rules.push((needle.to_string(), result));
        self
    }

    /// Queue an answer for the next prompt no rule matches
    pub fn then(self, result: Result<RawOutput, BackendError>) -> Self {
        self.queue.lock().unwrap().push_back(result);
        self
    }

    pub fn then_text(self, text: &str) -> Self {
        self.then(Ok(RawOutput::Text(text.to_string())))
    }

    pub fn with_speech(mut self, result: Result<SpeechAudio, BackendError>) -> Self {
        self.speech = Some(result);
        self
    }

    /// Every call takes this long (tokio time, so paused tests stay instant)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Highest number of calls that were running at the same time
    pub fn max_concurrency(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn enter(&self, task: &str, prompt: &str, credential: &Credential) {
        self.calls.lock().unwrap().push(RecordedCall {
            task: task.to_string(),
            prompt: prompt.to_string(),
            credential: credential.expose().to_string(),
        });
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn leave(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ModelBackend for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(
        &self,
        request: &GenerateRequest,
        credential: &Credential,
    ) -> Result<RawOutput, BackendError> {
        self.enter(&request.task, &request.prompt, credential).await;
        let answer = self
            .rules
            .iter()
            .find(|(needle, _)| request.prompt.contains(needle.as_str()))
            .map(|(_, result)| result.clone())
            .or_else(|| self.queue.lock().unwrap().pop_front())
            .unwrap_or_else(|| Err(BackendError::Malformed("no scripted answer".to_string())));
        self.leave();
        answer
    }

    async fn synthesize_speech(
        &self,
        request: &SpeechRequest,
        credential: &Credential,
    ) -> Result<SpeechAudio, BackendError> {
        self.enter("speech", &request.text, credential).await;
        self.leave();
        self.speech
            .clone()
            .unwrap_or_else(|| Err(BackendError::Malformed("no scripted speech".to_string())))
    }
}

/// Operation backend replaying a fixed sequence of status checks
pub struct ScriptedOperations {
    id: String,
    submitted: OperationStatus,
    checks: Mutex<VecDeque<Result<OperationHandle, BackendError>>>,
    media: Vec<u8>,
    submissions: AtomicUsize,
    check_count: AtomicUsize,
    credentials: Mutex<Vec<String>>,
}

impl ScriptedOperations {
    /// `submitted` is the status returned by the submit call itself
    pub fn new(id: &str, submitted: OperationStatus) -> Self {
        Self {
            id: id.to_string(),
            submitted,
            checks: Mutex::new(VecDeque::new()),
            media: b"fake-mp4-bytes".to_vec(),
            submissions: AtomicUsize::new(0),
            check_count: AtomicUsize::new(0),
            credentials: Mutex::new(Vec::new()),
        }
    }

    /// Next status check reports `status` for the same operation
    pub fn then(self, status: OperationStatus) -> Self {
        let handle = OperationHandle {
            id: self.id.clone(),
            status,
        };
        self.checks.lock().unwrap().push_back(Ok(handle));
        self
    }

    /// Next status check returns this raw result
    pub fn then_result(self, result: Result<OperationHandle, BackendError>) -> Self {
        self.checks.lock().unwrap().push_back(result);
        self
    }

    pub fn with_media(mut self, bytes: &[u8]) -> Self {
        self.media = bytes.to_vec();
        self
    }

    pub fn submissions(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }

    pub fn checks(&self) -> usize {
        self.check_count.load(Ordering::SeqCst)
    }

    pub fn credentials(&self) -> Vec<String> {
        self.credentials.lock().unwrap().clone()
    }

    pub fn handle(&self) -> OperationHandle {
        OperationHandle {
            id: self.id.clone(),
            status: self.submitted.clone(),
        }
    }
}

pub fn mp4(uri: &str) -> OperationStatus {
    OperationStatus::Done(vec![MediaArtifact {
        uri: uri.to_string(),
        content_type: "video/mp4".to_string(),
    }])
}

#[async_trait]
impl OperationBackend for ScriptedOperations {
    async fn submit_video(
        &self,
        _request: &VideoRequest,
        credential: &Credential,
    ) -> Result<OperationHandle, BackendError> {
        self.submissions.fetch_add(1, Ordering::SeqCst);
        self.credentials.lock().unwrap().push(credential.expose().to_string());
        Ok(self.handle())
    }

    async fn check_operation(
        &self,
        operation_id: &str,
        credential: &Credential,
    ) -> Result<OperationHandle, BackendError> {
        assert_eq!(operation_id, self.id, "poller must check the submitted operation");
        self.check_count.fetch_add(1, Ordering::SeqCst);
        self.credentials.lock().unwrap().push(credential.expose().to_string());
        self.checks.lock().unwrap().pop_front().unwrap_or_else(|| {
            Ok(OperationHandle {
                id: self.id.clone(),
                status: OperationStatus::Pending,
            })
        })
    }

    async fn fetch_media(
        &self,
        _artifact: &MediaArtifact,
        credential: &Credential,
    ) -> Result<Vec<u8>, BackendError> {
        self.credentials.lock().unwrap().push(credential.expose().to_string());
        Ok(self.media.clone())
    }
}

/// Search backend returning one fixed answer
pub struct ScriptedSearch {
    result: Result<Vec<SearchCandidate>, BackendError>,
    queries: Mutex<Vec<(String, usize)>>,
}

impl ScriptedSearch {
    pub fn returning(candidates: Vec<SearchCandidate>) -> Self {
        Self {
            result: Ok(candidates),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: BackendError) -> Self {
        Self {
            result: Err(error),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// (query, max_results) of every search made
    pub fn queries(&self) -> Vec<(String, usize)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchBackend for ScriptedSearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchCandidate>, BackendError> {
        self.queries.lock().unwrap().push((query.to_string(), max_results));
        self.result.clone()
    }
}

pub fn candidate(id: &str, description: &str) -> SearchCandidate {
    SearchCandidate {
        id: id.to_string(),
        title: format!("Video {}", id),
        description: description.to_string(),
        channel_title: "Study Channel".to_string(),
        thumbnail: format!("https://img.example/{}.jpg", id),
    }
}

/// A description long enough to be summarized, tagged so a scripted
/// model can recognise it in the rendered prompt
pub fn long_description(tag: &str) -> String {
    format!(
        "[{}] An in-depth walkthrough covering fundamentals, worked examples and practice problems.",
        tag
    )
}
