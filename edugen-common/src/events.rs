//! Pipeline event types and the broadcast EventBus
//!
//! Events are emitted by flow execution, fan-out enrichment and the
//! operation poller, and are serialized for SSE transmission.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Observable pipeline progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PipelineEvent {
    /// A single-shot task passed input validation and is about to call the model
    FlowStarted {
        invocation_id: Uuid,
        task: String,
        timestamp: DateTime<Utc>,
    },

    /// A task produced a schema-valid output
    FlowCompleted {
        invocation_id: Uuid,
        task: String,
        elapsed_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// A task failed; `kind` is the error taxonomy name
    FlowFailed {
        invocation_id: Uuid,
        task: String,
        kind: String,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// A fan-out batch finished merging its items
    EnrichmentCompleted {
        invocation_id: Uuid,
        total: usize,
        failed: usize,
        timestamp: DateTime<Utc>,
    },

    /// One more wait cycle elapsed on a pending long-running operation
    OperationProgress {
        operation_id: String,
        wait_cycles: u32,
        timestamp: DateTime<Utc>,
    },

    /// A long-running operation reached a terminal state
    OperationFinished {
        operation_id: String,
        succeeded: bool,
        wait_cycles: u32,
        timestamp: DateTime<Utc>,
    },
}

impl PipelineEvent {
    /// SSE event name
    pub fn event_type(&self) -> &'static str {
        match self {
            PipelineEvent::FlowStarted { .. } => "FlowStarted",
            PipelineEvent::FlowCompleted { .. } => "FlowCompleted",
            PipelineEvent::FlowFailed { .. } => "FlowFailed",
            PipelineEvent::EnrichmentCompleted { .. } => "EnrichmentCompleted",
            PipelineEvent::OperationProgress { .. } => "OperationProgress",
            PipelineEvent::OperationFinished { .. } => "OperationFinished",
        }
    }
}

/// Broadcast channel for pipeline events
///
/// Cloning shares the underlying channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<PipelineEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)`, or `Err` carrying the event back if no
    /// one is listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: PipelineEvent,
    ) -> Result<usize, broadcast::error::SendError<PipelineEvent>> {
        self.tx.send(event)
    }

    /// Emit without caring whether anyone is subscribed
    pub fn emit_lossy(&self, event: PipelineEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_emitted_events() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();

        let event = PipelineEvent::OperationProgress {
            operation_id: "operations/abc".to_string(),
            wait_cycles: 1,
            timestamp: Utc::now(),
        };
        assert_eq!(bus.emit(event.clone()).unwrap(), 1);
        assert_eq!(rx.recv().await.unwrap(), event);
    }

    #[test]
    fn emit_without_subscribers_is_an_error_but_lossy_is_not() {
        let bus = EventBus::new(4);
        let event = PipelineEvent::FlowStarted {
            invocation_id: Uuid::new_v4(),
            task: "generateQuiz".to_string(),
            timestamp: Utc::now(),
        };
        assert!(bus.emit(event.clone()).is_err());
        bus.emit_lossy(event);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn serializes_with_type_tag() {
        let event = PipelineEvent::FlowFailed {
            invocation_id: Uuid::nil(),
            task: "askAiTutor".to_string(),
            kind: "TimeoutError".to_string(),
            message: "deadline".to_string(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "FlowFailed");
        assert_eq!(json["kind"], "TimeoutError");
        assert_eq!(event.event_type(), "FlowFailed");
    }
}
