//! Fan-out enrichment: one search, then one summary per result
//!
//! Each result is summarized on its own task and writes only to its own
//! slot; slots are merged back in search order. A failed summary becomes a
//! placeholder on that item and never affects its siblings. Only a failed
//! search fails the whole call.

pub mod youtube;

pub use youtube::YouTubeSearchClient;

use crate::credential::Credential;
use crate::deadline::Deadline;
use crate::error::{ErrorKind, PipelineError};
use crate::flow::{FlowExecutor, TaskDefinition};
use crate::model::BackendError;
use crate::schema::{InputContract, ObjectSchema, Schema};
use chrono::Utc;
use edugen_common::events::{EventBus, PipelineEvent};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Upper bound on search results, and so on concurrent summaries
pub const MAX_CANDIDATES: usize = 6;
/// Descriptions this short (trimmed, in characters) are not worth a model call
pub const MIN_DESCRIPTION_CHARS: usize = 50;

pub const NO_SUMMARY: &str = "No summary available.";
pub const SUMMARY_FAILED: &str = "AI summary failed for this video.";
pub const EMPTY_SUMMARY: &str = "Could not generate summary.";

/// One search hit, before enrichment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCandidate {
    pub id: String,
    pub title: String,
    pub description: String,
    pub channel_title: String,
    pub thumbnail: String,
}

#[async_trait::async_trait]
pub trait SearchBackend: Send + Sync {
    /// Up to `max_results` hits, in relevance order
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchCandidate>, BackendError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Summarized,
    /// No model call was made, or it produced nothing usable
    Skipped,
    Failed,
}

/// Failure embedded in an item instead of thrown
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemFailure {
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentItem {
    pub id: String,
    pub title: String,
    pub thumbnail: String,
    pub channel_title: String,
    pub summary: String,
    pub status: ItemStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<ItemFailure>,
}

/// Batch-level marker that some items carry failures
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartialFailure {
    pub kind: ErrorKind,
    pub failed: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentBatch {
    pub videos: Vec<EnrichmentItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial_failure: Option<PartialFailure>,
}

enum ItemOutcome {
    Summarized(String),
    Skipped(&'static str),
    Failed(PipelineError),
}

impl EnrichmentItem {
    fn new(candidate: SearchCandidate, outcome: ItemOutcome) -> Self {
        let (summary, status, failure) = match outcome {
            ItemOutcome::Summarized(text) => (text, ItemStatus::Summarized, None),
            ItemOutcome::Skipped(placeholder) => (placeholder.to_string(), ItemStatus::Skipped, None),
            ItemOutcome::Failed(err) => (
                SUMMARY_FAILED.to_string(),
                ItemStatus::Failed,
                Some(ItemFailure {
                    kind: err.kind(),
                    message: err.to_string(),
                }),
            ),
        };
        Self {
            id: candidate.id,
            title: candidate.title,
            thumbnail: candidate.thumbnail,
            channel_title: candidate.channel_title,
            summary,
            status,
            failure,
        }
    }
}

/// Search-then-summarize over video results
pub struct VideoEnricher {
    search: Arc<dyn SearchBackend>,
    executor: Arc<FlowExecutor>,
    summarizer: Arc<TaskDefinition>,
    input: InputContract,
    events: Option<EventBus>,
}

impl VideoEnricher {
    pub fn new(
        search: Arc<dyn SearchBackend>,
        executor: Arc<FlowExecutor>,
        summarizer: Arc<TaskDefinition>,
    ) -> Self {
        Self {
            search,
            executor,
            summarizer,
            input: InputContract::new(ObjectSchema::new().required("topic", Schema::String)),
            events: None,
        }
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Find videos for `{topic, apiKey?}` and summarize each description
    ///
    /// # Errors
    ///
    /// - input `ValidationError`
    /// - `ConfigurationError` when no model credential exists (checked
    ///   before searching) or the search key is missing
    /// - any search failure, including `TimeoutError`
    ///
    /// Per-item summary failures are embedded in the batch, never returned.
    pub async fn find_and_summarize(
        &self,
        raw: Value,
        deadline: &Deadline,
    ) -> Result<EnrichmentBatch, PipelineError> {
        let input = self.input.validate(raw)?;
        let credential = self.executor.credentials().resolve(input.credential())?;
        let topic = input.get_str("topic").unwrap_or_default().trim();
        let query = format!("{} tutorial full course", topic);

        let mut candidates = deadline
            .run("video search", async {
                self.search
                    .search(&query, MAX_CANDIDATES)
                    .await
                    .map_err(PipelineError::from)
            })
            .await?;
        candidates.truncate(MAX_CANDIDATES);

        let invocation_id = Uuid::new_v4();
        let outcomes = self.summarize_all(&candidates, &credential, deadline).await;

        let videos: Vec<EnrichmentItem> = candidates
            .into_iter()
            .zip(outcomes)
            .map(|(candidate, outcome)| EnrichmentItem::new(candidate, outcome))
            .collect();

        let total = videos.len();
        let failed = videos.iter().filter(|v| v.status == ItemStatus::Failed).count();
        info!(%invocation_id, topic, total, failed, "Video enrichment complete");
        if let Some(bus) = &self.events {
            bus.emit_lossy(PipelineEvent::EnrichmentCompleted {
                invocation_id,
                total,
                failed,
                timestamp: Utc::now(),
            });
        }

        Ok(EnrichmentBatch {
            videos,
            partial_failure: (failed > 0).then_some(PartialFailure {
                kind: ErrorKind::PartialFailure,
                failed,
                total,
            }),
        })
    }

    /// One outcome per candidate, in candidate order
    async fn summarize_all(
        &self,
        candidates: &[SearchCandidate],
        credential: &Credential,
        deadline: &Deadline,
    ) -> Vec<ItemOutcome> {
        let mut slots: Vec<Option<ItemOutcome>> = candidates.iter().map(|_| None).collect();
        let mut tasks = JoinSet::new();

        for (index, candidate) in candidates.iter().enumerate() {
            if candidate.description.trim().chars().count() <= MIN_DESCRIPTION_CHARS {
                debug!(video = %candidate.id, "Description too short to summarize");
                slots[index] = Some(ItemOutcome::Skipped(NO_SUMMARY));
                continue;
            }

            let executor = Arc::clone(&self.executor);
            let summarizer = Arc::clone(&self.summarizer);
            let description = candidate.description.clone();
            let credential = credential.clone();
            let deadline = deadline.clone();
            tasks.spawn(async move {
                let outcome = summarize_one(&executor, &summarizer, description, credential, &deadline).await;
                (index, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => slots[index] = Some(outcome),
                Err(e) => warn!("Summary task did not complete: {}", e),
            }
        }

        slots
            .into_iter()
            .map(|slot| {
                slot.unwrap_or_else(|| {
                    ItemOutcome::Failed(PipelineError::UpstreamUnavailable(
                        "summary task did not complete".to_string(),
                    ))
                })
            })
            .collect()
    }
}

async fn summarize_one(
    executor: &FlowExecutor,
    summarizer: &TaskDefinition,
    description: String,
    credential: Credential,
    deadline: &Deadline,
) -> ItemOutcome {
    let input = match summarizer.validate_input(json!({ "description": description })) {
        Ok(input) => input.with_credential(Some(credential)),
        Err(e) => return ItemOutcome::Failed(e),
    };

    match executor.execute_record(summarizer, input, deadline).await {
        Ok(output) => match output.value().as_str().map(str::trim) {
            Some(text) if !text.is_empty() => ItemOutcome::Summarized(text.to_string()),
            _ => ItemOutcome::Skipped(EMPTY_SUMMARY),
        },
        Err(e) => {
            warn!(kind = %e.kind(), error = %e, "Video summary failed");
            ItemOutcome::Failed(e)
        }
    }
}
