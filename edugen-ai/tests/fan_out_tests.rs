//! Fan-out enrichment: one search, isolated concurrent summaries,
//! results in search order

mod helpers;

use edugen_ai::credential::{Credential, CredentialResolver};
use edugen_ai::deadline::Deadline;
use edugen_ai::enrich::{
    ItemStatus, VideoEnricher, EMPTY_SUMMARY, MAX_CANDIDATES, NO_SUMMARY, SUMMARY_FAILED,
};
use edugen_ai::flow::FlowExecutor;
use edugen_ai::model::{BackendError, RawOutput};
use edugen_ai::tasks::summarize_video_description;
use edugen_ai::ErrorKind;
use edugen_common::events::{EventBus, PipelineEvent};
use helpers::{candidate, long_description, ScriptedModel, ScriptedSearch, SYSTEM_KEY};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn enricher(model: &Arc<ScriptedModel>, search: &Arc<ScriptedSearch>, default_key: Option<&str>) -> VideoEnricher {
    let executor = FlowExecutor::new(
        model.clone(),
        CredentialResolver::new(default_key.map(Credential::new)),
    );
    VideoEnricher::new(
        search.clone(),
        Arc::new(executor),
        Arc::new(summarize_video_description().unwrap()),
    )
}

fn summary_for(tag: &str) -> Result<RawOutput, BackendError> {
    Ok(RawOutput::Text(format!("Summary of {}", tag)))
}

/// Model that summarizes every tagged description, except `failing`
fn model_failing_on(tags: &[&str], failing: &str) -> ScriptedModel {
    let mut model = ScriptedModel::new().when_prompt_contains(
        &format!("[{}]", failing),
        Err(BackendError::Unavailable("HTTP 503: overloaded".into())),
    );
    for tag in tags {
        model = model.when_prompt_contains(&format!("[{}]", tag), summary_for(tag));
    }
    model
}

#[tokio::test]
async fn one_failed_summary_leaves_siblings_intact_and_in_order() {
    let tags = ["v1", "v2", "v3", "v4", "v5"];
    let model = Arc::new(model_failing_on(&tags, "v3"));
    let search = Arc::new(ScriptedSearch::returning(
        tags.iter().map(|t| candidate(t, &long_description(t))).collect(),
    ));

    let batch = enricher(&model, &search, Some(SYSTEM_KEY))
        .find_and_summarize(json!({"topic": "photosynthesis"}), &Deadline::unbounded())
        .await
        .unwrap();

    let ids: Vec<&str> = batch.videos.iter().map(|v| v.id.as_str()).collect();
    assert_eq!(ids, tags);

    for (index, item) in batch.videos.iter().enumerate() {
        if index == 2 {
            assert_eq!(item.status, ItemStatus::Failed);
            assert_eq!(item.summary, SUMMARY_FAILED);
            let failure = item.failure.as_ref().unwrap();
            assert_eq!(failure.kind, ErrorKind::UpstreamUnavailable);
        } else {
            assert_eq!(item.status, ItemStatus::Summarized);
            assert_eq!(item.summary, format!("Summary of {}", tags[index]));
            assert!(item.failure.is_none());
        }
    }

    let partial = batch.partial_failure.unwrap();
    assert_eq!(partial.kind, ErrorKind::PartialFailure);
    assert_eq!((partial.failed, partial.total), (1, 5));
    assert_eq!(model.call_count(), 5);
}

#[tokio::test]
async fn failed_search_fails_the_whole_call() {
    let model = Arc::new(ScriptedModel::new());
    let search = Arc::new(ScriptedSearch::failing(BackendError::Unavailable(
        "video search network error".into(),
    )));

    let err = enricher(&model, &search, Some(SYSTEM_KEY))
        .find_and_summarize(json!({"topic": "fractions"}), &Deadline::unbounded())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn missing_search_key_is_a_configuration_error() {
    let model = Arc::new(ScriptedModel::new());
    let search = Arc::new(ScriptedSearch::failing(BackendError::Unauthorized(
        "video search key is not configured".into(),
    )));

    let err = enricher(&model, &search, Some(SYSTEM_KEY))
        .find_and_summarize(json!({"topic": "fractions"}), &Deadline::unbounded())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ConfigurationError);
}

#[tokio::test]
async fn missing_model_key_fails_before_searching() {
    let model = Arc::new(ScriptedModel::new());
    let search = Arc::new(ScriptedSearch::returning(vec![candidate("v1", &long_description("v1"))]));

    let err = enricher(&model, &search, None)
        .find_and_summarize(json!({"topic": "fractions"}), &Deadline::unbounded())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ConfigurationError);
    assert!(search.queries().is_empty());
}

#[tokio::test]
async fn query_and_result_cap_are_fixed() {
    let model = Arc::new(ScriptedModel::new());
    let search = Arc::new(ScriptedSearch::returning(Vec::new()));

    let batch = enricher(&model, &search, Some(SYSTEM_KEY))
        .find_and_summarize(json!({"topic": "  photosynthesis "}), &Deadline::unbounded())
        .await
        .unwrap();

    assert!(batch.videos.is_empty());
    assert!(batch.partial_failure.is_none());
    assert_eq!(
        search.queries(),
        vec![("photosynthesis tutorial full course".to_string(), MAX_CANDIDATES)]
    );
}

#[tokio::test]
async fn short_descriptions_are_not_sent_to_the_model() {
    let model = Arc::new(ScriptedModel::new().when_prompt_contains("[long]", summary_for("long")));
    let search = Arc::new(ScriptedSearch::returning(vec![
        candidate("short", "Just a quick intro."),
        candidate("long", &long_description("long")),
        candidate("blank", "   "),
    ]));

    let batch = enricher(&model, &search, Some(SYSTEM_KEY))
        .find_and_summarize(json!({"topic": "algebra"}), &Deadline::unbounded())
        .await
        .unwrap();

    assert_eq!(batch.videos[0].summary, NO_SUMMARY);
    assert_eq!(batch.videos[0].status, ItemStatus::Skipped);
    assert_eq!(batch.videos[1].summary, "Summary of long");
    assert_eq!(batch.videos[2].summary, NO_SUMMARY);
    assert!(batch.partial_failure.is_none());
    assert_eq!(model.call_count(), 1);
}

#[tokio::test]
async fn empty_model_output_gets_placeholder() {
    let model = Arc::new(ScriptedModel::new().then_text("   "));
    let search = Arc::new(ScriptedSearch::returning(vec![candidate("v1", &long_description("v1"))]));

    let batch = enricher(&model, &search, Some(SYSTEM_KEY))
        .find_and_summarize(json!({"topic": "algebra"}), &Deadline::unbounded())
        .await
        .unwrap();

    assert_eq!(batch.videos[0].summary, EMPTY_SUMMARY);
    assert_eq!(batch.videos[0].status, ItemStatus::Skipped);
}

#[tokio::test(start_paused = true)]
async fn summaries_run_concurrently_and_results_are_capped() {
    let tags: Vec<String> = (1..=8).map(|i| format!("v{}", i)).collect();
    let mut model = ScriptedModel::new().with_delay(Duration::from_secs(2));
    for tag in &tags {
        model = model.when_prompt_contains(&format!("[{}]", tag), summary_for(tag));
    }
    let model = Arc::new(model);
    let search = Arc::new(ScriptedSearch::returning(
        tags.iter().map(|t| candidate(t, &long_description(t))).collect(),
    ));

    let started = tokio::time::Instant::now();
    let batch = enricher(&model, &search, Some(SYSTEM_KEY))
        .find_and_summarize(json!({"topic": "chemistry"}), &Deadline::unbounded())
        .await
        .unwrap();

    assert_eq!(batch.videos.len(), MAX_CANDIDATES);
    assert_eq!(batch.videos.last().unwrap().id, "v6");
    assert_eq!(model.max_concurrency(), MAX_CANDIDATES);
    assert!(started.elapsed() < Duration::from_secs(4), "summaries ran sequentially");
}

#[tokio::test(start_paused = true)]
async fn slow_summaries_time_out_as_item_failures() {
    let model = Arc::new(
        ScriptedModel::new()
            .with_delay(Duration::from_secs(30))
            .when_prompt_contains("[v1]", summary_for("v1")),
    );
    let search = Arc::new(ScriptedSearch::returning(vec![candidate("v1", &long_description("v1"))]));

    let batch = enricher(&model, &search, Some(SYSTEM_KEY))
        .find_and_summarize(json!({"topic": "physics"}), &Deadline::after(Duration::from_secs(5)))
        .await
        .unwrap();

    let item = &batch.videos[0];
    assert_eq!(item.status, ItemStatus::Failed);
    assert_eq!(item.failure.as_ref().unwrap().kind, ErrorKind::TimeoutError);
}

#[tokio::test]
async fn caller_key_reaches_every_summary() {
    let tags = ["v1", "v2"];
    let model = Arc::new(model_failing_on(&tags, "none"));
    let search = Arc::new(ScriptedSearch::returning(
        tags.iter().map(|t| candidate(t, &long_description(t))).collect(),
    ));

    enricher(&model, &search, Some(SYSTEM_KEY))
        .find_and_summarize(json!({"topic": "history", "apiKey": "caller-key"}), &Deadline::unbounded())
        .await
        .unwrap();

    let calls = model.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|c| c.credential == "caller-key"));
}

#[tokio::test]
async fn batch_serializes_for_clients() {
    let tags = ["v1", "v2"];
    let model = Arc::new(model_failing_on(&tags[..1], "v2"));
    let search = Arc::new(ScriptedSearch::returning(
        tags.iter().map(|t| candidate(t, &long_description(t))).collect(),
    ));
    let bus = EventBus::new(8);
    let mut rx = bus.subscribe();

    let batch = enricher(&model, &search, Some(SYSTEM_KEY))
        .with_events(bus)
        .find_and_summarize(json!({"topic": "geometry"}), &Deadline::unbounded())
        .await
        .unwrap();

    let value = serde_json::to_value(&batch).unwrap();
    assert_eq!(value["videos"][0]["channelTitle"], "Study Channel");
    assert_eq!(value["videos"][0]["status"], "summarized");
    assert!(value["videos"][0].get("failure").is_none());
    assert_eq!(value["videos"][1]["failure"]["kind"], "UpstreamUnavailable");
    assert_eq!(value["partialFailure"], json!({"kind": "PartialFailure", "failed": 1, "total": 2}));

    match rx.try_recv().unwrap() {
        PipelineEvent::EnrichmentCompleted { total, failed, .. } => assert_eq!((total, failed), (2, 1)),
        other => panic!("unexpected event {:?}", other),
    }
}
