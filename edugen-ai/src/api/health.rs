//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status ("ok")
    pub status: String,
    /// Module name ("edugen-ai")
    pub module: String,
    /// Crate version from Cargo.toml
    pub version: String,
    /// Commit the binary was built from
    pub git_hash: String,
    pub built_at: String,
    /// Cargo profile ("debug" or "release")
    pub build_profile: String,
    /// Seconds since service started
    pub uptime_seconds: u64,
    /// Number of single-shot tasks in the catalog
    pub tasks: usize,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;

    Json(HealthResponse {
        status: "ok".to_string(),
        module: "edugen-ai".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: env!("EDUGEN_GIT_HASH").to_string(),
        built_at: env!("EDUGEN_BUILT_AT").to_string(),
        build_profile: env!("EDUGEN_BUILD_PROFILE").to_string(),
        uptime_seconds,
        tasks: state.tasks.len(),
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
