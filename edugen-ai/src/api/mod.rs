//! HTTP API handlers for edugen-ai
//!
//! Every failure is rendered by [`ApiError`] as `{kind, message}`.

pub mod flows;
pub mod health;
pub mod media;
pub mod sse;
pub mod videos;

pub use flows::task_routes;
pub use health::health_routes;
pub use media::media_routes;
pub use sse::event_stream;
pub use videos::video_routes;

use crate::deadline::Deadline;
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::http::HeaderMap;
use axum::Json;
use serde_json::Value;
use std::time::Duration;

/// Optional per-request deadline, in milliseconds
pub const REQUEST_TIMEOUT_HEADER: &str = "x-request-timeout-ms";

/// Deadline for one request, ended early by service shutdown
///
/// # Errors
///
/// `BadRequest` if the timeout header is present but not a positive integer.
pub(crate) fn request_deadline(state: &AppState, headers: &HeaderMap) -> ApiResult<Deadline> {
    let budget = match headers.get(REQUEST_TIMEOUT_HEADER) {
        None => state.request_timeout,
        Some(value) => value
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .ok_or_else(|| {
                ApiError::BadRequest(format!(
                    "{} must be a positive integer number of milliseconds",
                    REQUEST_TIMEOUT_HEADER
                ))
            })?,
    };

    Ok(Deadline::after(budget).with_cancellation(state.shutdown.child_token()))
}

/// Unwrap a JSON body, turning syntax and content-type problems into 400s
pub(crate) fn json_body(body: Result<Json<Value>, JsonRejection>) -> ApiResult<Value> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}
