//! edugen-ai library interface
//!
//! Exposes the pipeline and the HTTP router for the binary and for
//! integration tests.

pub mod api;
pub mod audio;
pub mod config;
pub mod credential;
pub mod deadline;
pub mod enrich;
pub mod error;
pub mod flow;
pub mod media;
pub mod model;
pub mod operation;
pub mod prompt;
pub mod schema;
pub mod tasks;

pub use crate::error::{ApiError, ApiResult, ErrorKind, PipelineError};

use crate::credential::{Credential, CredentialResolver};
use crate::enrich::{SearchBackend, VideoEnricher};
use crate::flow::FlowExecutor;
use crate::media::{AudioGenerator, VideoGenerator, DEFAULT_OPERATION_BUDGET};
use crate::model::{ModelBackend, OperationBackend};
use crate::operation::{OperationPoller, DEFAULT_POLL_INTERVAL};
use crate::prompt::TemplateError;
use crate::tasks::TaskRegistry;
use axum::Router;
use chrono::{DateTime, Utc};
use edugen_common::events::EventBus;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

/// The three external collaborators the pipeline talks to
#[derive(Clone)]
pub struct Backends {
    pub model: Arc<dyn ModelBackend>,
    pub operations: Arc<dyn OperationBackend>,
    pub search: Arc<dyn SearchBackend>,
}

/// Process-wide knobs, fixed at startup
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Used when a call supplies no key of its own
    pub default_credential: Option<Credential>,
    /// Deadline for requests that do not send `x-request-timeout-ms`
    pub request_timeout: Duration,
    pub operation_budget: Duration,
    pub poll_interval: Duration,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            default_credential: None,
            request_timeout: Duration::from_secs(120),
            operation_budget: DEFAULT_OPERATION_BUDGET,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl From<&config::ServiceSettings> for PipelineOptions {
    fn from(settings: &config::ServiceSettings) -> Self {
        Self {
            default_credential: settings.gemini_api_key.clone(),
            request_timeout: settings.request_timeout,
            operation_budget: settings.operation_budget,
            poll_interval: settings.poll_interval,
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub tasks: Arc<TaskRegistry>,
    pub executor: Arc<FlowExecutor>,
    pub enricher: Arc<VideoEnricher>,
    pub video: Arc<VideoGenerator>,
    pub audio: Arc<AudioGenerator>,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Cancelled on shutdown; every request deadline derives from it
    pub shutdown: CancellationToken,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    pub request_timeout: Duration,
}

impl AppState {
    /// Wire the pipeline over `backends`
    ///
    /// # Errors
    ///
    /// A built-in task template failed to parse.
    pub fn new(
        backends: Backends,
        options: PipelineOptions,
        event_bus: EventBus,
    ) -> Result<Self, TemplateError> {
        let tasks = TaskRegistry::builtin()?;
        let credentials = CredentialResolver::new(options.default_credential);

        let executor = Arc::new(
            FlowExecutor::new(Arc::clone(&backends.model), credentials.clone())
                .with_events(event_bus.clone()),
        );

        let summarizer = Arc::new(tasks::summarize_video_description()?);
        let enricher = VideoEnricher::new(backends.search, Arc::clone(&executor), summarizer)
            .with_events(event_bus.clone());

        let poller = OperationPoller::new(options.poll_interval).with_events(event_bus.clone());
        let video = VideoGenerator::new(backends.operations, credentials.clone(), poller)
            .with_budget(options.operation_budget);
        let audio = AudioGenerator::new(backends.model, credentials);

        Ok(Self {
            tasks: Arc::new(tasks),
            executor,
            enricher: Arc::new(enricher),
            video: Arc::new(video),
            audio: Arc::new(audio),
            event_bus,
            shutdown: CancellationToken::new(),
            startup_time: Utc::now(),
            request_timeout: options.request_timeout,
        })
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .merge(api::task_routes())
        .merge(api::video_routes())
        .merge(api::media_routes())
        .merge(api::health_routes())
        .route("/events", get(api::event_stream))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
