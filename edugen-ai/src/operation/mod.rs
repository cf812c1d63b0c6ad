//! Long-running operation polling
//!
//! A media job is submitted once and then observed until it reaches a
//! terminal state. Handles only move forward:
//! `Pending → Pending* → Done | Failed`. Polling stops at the first terminal
//! state and never retries a failed job.

use crate::credential::Credential;
use crate::deadline::Deadline;
use crate::error::PipelineError;
use crate::model::OperationBackend;
use crate::schema::{Origin, ValidationError};
use chrono::Utc;
use edugen_common::events::{EventBus, PipelineEvent};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Wait between status checks unless configured otherwise
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Reference to a produced media file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaArtifact {
    pub uri: String,
    pub content_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationStatus {
    Pending,
    /// Finished; zero or more produced artifacts
    Done(Vec<MediaArtifact>),
    /// Finished with an error reported by the backend
    Failed(String),
}

impl OperationStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OperationStatus::Pending)
    }
}

/// Snapshot of a job; each poll yields a replacement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationHandle {
    pub id: String,
    pub status: OperationStatus,
}

/// Family of media a caller expects from a finished job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
}

impl MediaKind {
    fn preferred(&self) -> &'static str {
        match self {
            MediaKind::Video => "video/mp4",
        }
    }

    fn family(&self) -> &'static str {
        match self {
            MediaKind::Video => "video/",
        }
    }
}

/// Terminal success of a poll loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolledArtifact {
    pub operation_id: String,
    pub artifact: MediaArtifact,
    /// Number of interval waits before the job was seen terminal
    pub wait_cycles: u32,
}

/// Pick the one artifact a caller gets from a finished job
///
/// An exact match on the preferred type wins; otherwise the first artifact
/// of the same family is accepted with a warning.
pub fn select_artifact(
    artifacts: &[MediaArtifact],
    kind: MediaKind,
) -> Result<MediaArtifact, PipelineError> {
    if let Some(exact) = artifacts
        .iter()
        .find(|a| a.content_type.eq_ignore_ascii_case(kind.preferred()))
    {
        return Ok(exact.clone());
    }

    if let Some(fallback) = artifacts
        .iter()
        .find(|a| a.content_type.to_ascii_lowercase().starts_with(kind.family()))
    {
        warn!(
            content_type = %fallback.content_type,
            preferred = kind.preferred(),
            "Preferred media type not produced, using fallback"
        );
        return Ok(fallback.clone());
    }

    Err(ValidationError::new(
        Origin::Output,
        "$.artifacts",
        format!("a {}* artifact", kind.family()),
        format!("{} artifact(s) of other types", artifacts.len()),
    )
    .into())
}

/// Drives one operation to its terminal state
#[derive(Debug, Clone)]
pub struct OperationPoller {
    interval: Duration,
    events: Option<EventBus>,
}

impl OperationPoller {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            events: None,
        }
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    fn emit(&self, event: PipelineEvent) {
        if let Some(bus) = &self.events {
            bus.emit_lossy(event);
        }
    }

    /// Poll `handle` until terminal and select its artifact
    ///
    /// A handle that is already terminal is resolved without any wait or
    /// status check.
    ///
    /// # Errors
    ///
    /// - `UpstreamRejected` if the job reports an error (not retried)
    /// - output `ValidationError` if it finishes without a matching artifact
    /// - `TimeoutError` if `deadline` passes or is cancelled while waiting
    /// - whatever a status check fails with
    pub async fn await_artifact(
        &self,
        backend: &dyn OperationBackend,
        mut handle: OperationHandle,
        credential: &Credential,
        kind: MediaKind,
        deadline: &Deadline,
    ) -> Result<PolledArtifact, PipelineError> {
        let mut wait_cycles: u32 = 0;

        let result = loop {
            match &handle.status {
                OperationStatus::Pending => {
                    deadline.sleep("media generation", self.interval).await?;
                    wait_cycles += 1;

                    let next = deadline
                        .run("operation status check", async {
                            backend
                                .check_operation(&handle.id, credential)
                                .await
                                .map_err(PipelineError::from)
                        })
                        .await?;

                    if next.id != handle.id {
                        break Err(PipelineError::UpstreamUnavailable(format!(
                            "operation {} answered as {}",
                            handle.id, next.id
                        )));
                    }

                    debug!(operation = %handle.id, wait_cycles, terminal = next.status.is_terminal(), "Polled operation");
                    self.emit(PipelineEvent::OperationProgress {
                        operation_id: handle.id.clone(),
                        wait_cycles,
                        timestamp: Utc::now(),
                    });
                    handle = next;
                }
                OperationStatus::Failed(message) => {
                    break Err(PipelineError::UpstreamRejected(format!(
                        "operation {} failed: {}",
                        handle.id, message
                    )));
                }
                OperationStatus::Done(artifacts) => {
                    break select_artifact(artifacts, kind).map(|artifact| PolledArtifact {
                        operation_id: handle.id.clone(),
                        artifact,
                        wait_cycles,
                    });
                }
            }
        };

        info!(
            operation = %handle.id,
            wait_cycles,
            succeeded = result.is_ok(),
            "Operation reached terminal state"
        );
        self.emit(PipelineEvent::OperationFinished {
            operation_id: handle.id.clone(),
            succeeded: result.is_ok(),
            wait_cycles,
            timestamp: Utc::now(),
        });
        result
    }
}

impl Default for OperationPoller {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}
