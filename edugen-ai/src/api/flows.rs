//! Single-shot task endpoints
//!
//! GET /api/tasks, POST /api/tasks/:name

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;

use super::{json_body, request_deadline};
use crate::error::{ApiError, ApiResult};
use crate::flow::TaskDefinition;
use crate::schema::{CredentialPolicy, Presence};
use crate::AppState;

/// One input field as advertised to clients
#[derive(Debug, Serialize)]
pub struct InputFieldSummary {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub required: bool,
}

/// GET /api/tasks entry
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSummary {
    pub name: String,
    pub description: String,
    pub inputs: Vec<InputFieldSummary>,
    /// Whether the request may carry its own `apiKey`
    pub accepts_api_key: bool,
}

impl From<&TaskDefinition> for TaskSummary {
    fn from(task: &TaskDefinition) -> Self {
        Self {
            name: task.name().to_string(),
            description: task.description().to_string(),
            inputs: task
                .input()
                .schema()
                .fields()
                .iter()
                .map(|field| InputFieldSummary {
                    name: field.name.clone(),
                    field_type: field.schema.describe(),
                    required: field.presence == Presence::Required,
                })
                .collect(),
            accepts_api_key: task.input().credential_policy() == CredentialPolicy::CallerMaySupply,
        }
    }
}

/// GET /api/tasks
pub async fn list_tasks(State(state): State<AppState>) -> Json<Vec<TaskSummary>> {
    Json(state.tasks.iter().map(|task| TaskSummary::from(task.as_ref())).collect())
}

/// POST /api/tasks/:name
///
/// Body is the task's input object (plus optional `apiKey`); the response
/// is the validated output object.
pub async fn run_task(
    State(state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let task = state
        .tasks
        .get(&name)
        .ok_or_else(|| ApiError::NotFound(format!("task {}", name)))?;
    let raw = json_body(body)?;
    let deadline = request_deadline(&state, &headers)?;

    let output = state.executor.execute(&task, raw, &deadline).await?;
    Ok(Json(output.into_value()))
}

/// Build task routes
pub fn task_routes() -> Router<AppState> {
    Router::new()
        .route("/api/tasks", get(list_tasks))
        .route("/api/tasks/:name", post(run_task))
}
