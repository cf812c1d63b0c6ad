//! Server-Sent Events for pipeline activity

use crate::AppState;
use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;

/// GET /events
///
/// Streams flow, enrichment and operation events as they happen.
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    edugen_common::sse::event_bus_sse_stream("edugen-ai", &state.event_bus)
}
