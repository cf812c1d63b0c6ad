//! Test Helper Utilities
//!
//! Shared scripted backends and app wiring for edugen-ai integration tests

#![allow(dead_code)]

pub mod backends;

pub use backends::{candidate, long_description, ScriptedModel, ScriptedOperations, ScriptedSearch};

use edugen_ai::credential::Credential;
use edugen_ai::{AppState, Backends, PipelineOptions};
use edugen_common::events::EventBus;
use std::sync::Arc;
use std::time::Duration;

/// Process default key used by most tests
pub const SYSTEM_KEY: &str = "system-test-key";

pub fn options_with_key() -> PipelineOptions {
    PipelineOptions {
        default_credential: Some(Credential::new(SYSTEM_KEY)),
        request_timeout: Duration::from_secs(30),
        operation_budget: Duration::from_secs(600),
        poll_interval: Duration::from_secs(5),
    }
}

/// App state over scripted backends
pub fn test_state(
    model: Arc<ScriptedModel>,
    operations: Arc<ScriptedOperations>,
    search: Arc<ScriptedSearch>,
    options: PipelineOptions,
) -> AppState {
    let backends = Backends {
        model,
        operations,
        search,
    };
    AppState::new(backends, options, EventBus::new(100)).expect("built-in catalog parses")
}
