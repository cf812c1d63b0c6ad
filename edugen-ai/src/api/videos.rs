//! POST /api/videos/search

use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use serde_json::Value;

use super::{json_body, request_deadline};
use crate::enrich::EnrichmentBatch;
use crate::error::ApiResult;
use crate::AppState;

/// Search videos for `{topic}` and summarize each one
///
/// Items whose summary failed are still returned, with a placeholder and
/// an embedded failure; only a failed search is an error response.
pub async fn search_videos(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<EnrichmentBatch>> {
    let raw = json_body(body)?;
    let deadline = request_deadline(&state, &headers)?;
    let batch = state.enricher.find_and_summarize(raw, &deadline).await?;
    Ok(Json(batch))
}

pub fn video_routes() -> Router<AppState> {
    Router::new().route("/api/videos/search", post(search_videos))
}
