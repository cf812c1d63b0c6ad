//! Media generation endpoints

use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use serde_json::Value;

use super::{json_body, request_deadline};
use crate::error::ApiResult;
use crate::media::{GeneratedAudio, GeneratedVideo};
use crate::AppState;

/// POST /api/media/video
///
/// Holds the request open while the job is polled; the response embeds
/// the clip as a data URI.
pub async fn generate_video(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<GeneratedVideo>> {
    let raw = json_body(body)?;
    let deadline = request_deadline(&state, &headers)?;
    Ok(Json(state.video.generate(raw, &deadline).await?))
}

/// POST /api/media/audio
pub async fn generate_audio(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<GeneratedAudio>> {
    let raw = json_body(body)?;
    let deadline = request_deadline(&state, &headers)?;
    Ok(Json(state.audio.generate(raw, &deadline).await?))
}

pub fn media_routes() -> Router<AppState> {
    Router::new()
        .route("/api/media/video", post(generate_video))
        .route("/api/media/audio", post(generate_audio))
}
