//! Single-shot flow execution
//!
//! `validate input → render prompt → resolve credential → invoke model →
//! parse → validate output`. Nothing reaches the backend unless the input
//! validated and a credential was found.

use crate::credential::CredentialResolver;
use crate::deadline::Deadline;
use crate::error::PipelineError;
use crate::model::{GenerateRequest, ModelBackend, RawOutput};
use crate::prompt::{Template, TemplateError};
use crate::schema::{
    parse_model_output, validate_output, InputContract, InputRecord, Schema,
};
use chrono::Utc;
use edugen_common::events::{EventBus, PipelineEvent};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

// ============================================================================
// Task definitions
// ============================================================================

/// One model-backed operation, as data
///
/// Immutable once built; share it as `Arc<TaskDefinition>`.
#[derive(Debug, Clone)]
pub struct TaskDefinition {
    name: String,
    description: String,
    input: InputContract,
    output: Schema,
    /// Output schema minus fixed fields; what the model is asked for
    model_output: Schema,
    template: Template,
    fixed_output: Map<String, Value>,
}

impl TaskDefinition {
    /// # Errors
    ///
    /// The template fails to parse, or refers to a top-level field the input
    /// contract does not declare.
    pub fn new(
        name: &str,
        description: &str,
        input: InputContract,
        output: impl Into<Schema>,
        template: &str,
    ) -> Result<Self, TemplateError> {
        let template = Template::parse(template)?;
        if let Some(field) = template
            .root_fields()
            .into_iter()
            .find(|f| input.schema().field(f).is_none())
        {
            return Err(TemplateError::UnknownField {
                field: field.to_string(),
            });
        }

        let output = output.into();
        Ok(Self {
            name: name.to_string(),
            description: description.to_string(),
            input,
            model_output: output.clone(),
            output,
            template,
            fixed_output: Map::new(),
        })
    }

    /// Set `field` to `value` on every output instead of asking the model for it
    pub fn with_fixed_output(mut self, field: &str, value: Value) -> Self {
        self.fixed_output.insert(field.to_string(), value);
        if let Schema::Object(object) = &self.output {
            let names: Vec<&str> = self.fixed_output.keys().map(String::as_str).collect();
            self.model_output = Schema::Object(object.without(&names));
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn input(&self) -> &InputContract {
        &self.input
    }

    pub fn output(&self) -> &Schema {
        &self.output
    }

    pub fn model_output(&self) -> &Schema {
        &self.model_output
    }

    pub fn validate_input(&self, raw: Value) -> Result<InputRecord, PipelineError> {
        self.input.validate(raw).map_err(PipelineError::from)
    }

    /// The exact instruction sent for `input`. Deterministic.
    pub fn render(&self, input: &InputRecord) -> String {
        self.template.render(&input.to_value())
    }

    /// Parse what the model returned, merge fixed fields, validate the result
    pub fn validate_output(&self, raw: RawOutput) -> Result<OutputRecord, PipelineError> {
        let mut value = match raw {
            RawOutput::Text(text) => parse_model_output(&self.model_output, &text)?,
            RawOutput::Json(value) => value,
        };
        if let Value::Object(fields) = &mut value {
            for (name, fixed) in &self.fixed_output {
                fields.insert(name.clone(), fixed.clone());
            }
        }
        let value = validate_output(&self.output, &value)?;
        Ok(OutputRecord { value })
    }
}

/// Output that satisfied the task's full output schema
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRecord {
    value: Value,
}

impl OutputRecord {
    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.value.get(field).and_then(Value::as_str)
    }
}

// ============================================================================
// Executor
// ============================================================================

/// Runs task definitions against a model backend
///
/// Stateless between calls; safe to share across concurrent requests.
pub struct FlowExecutor {
    backend: Arc<dyn ModelBackend>,
    credentials: CredentialResolver,
    events: Option<EventBus>,
}

impl FlowExecutor {
    pub fn new(backend: Arc<dyn ModelBackend>, credentials: CredentialResolver) -> Self {
        Self {
            backend,
            credentials,
            events: None,
        }
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn credentials(&self) -> &CredentialResolver {
        &self.credentials
    }

    /// Validate a raw request and run it
    ///
    /// # Errors
    ///
    /// Input `ValidationError` before anything else happens; then any of
    /// the failures of [`FlowExecutor::execute_record`].
    pub async fn execute(
        &self,
        task: &TaskDefinition,
        raw: Value,
        deadline: &Deadline,
    ) -> Result<OutputRecord, PipelineError> {
        let input = task.validate_input(raw).map_err(|e| {
            debug!(task = task.name(), error = %e, "Rejected flow input");
            e
        })?;
        self.execute_record(task, input, deadline).await
    }

    /// Run an already-validated input
    ///
    /// # Errors
    ///
    /// - `ConfigurationError` if no credential is available (no call is made)
    /// - `UpstreamUnavailable` / `UpstreamRejected` from the backend
    /// - output `ValidationError` if the model's answer breaks the contract
    /// - `TimeoutError` if `deadline` expires or is cancelled
    pub async fn execute_record(
        &self,
        task: &TaskDefinition,
        input: InputRecord,
        deadline: &Deadline,
    ) -> Result<OutputRecord, PipelineError> {
        let invocation_id = Uuid::new_v4();
        let started = Instant::now();
        self.emit(PipelineEvent::FlowStarted {
            invocation_id,
            task: task.name().to_string(),
            timestamp: Utc::now(),
        });

        let outcome = self.invoke(task, &input, deadline).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &outcome {
            Ok(_) => {
                info!(task = task.name(), %invocation_id, elapsed_ms, "Flow completed");
                self.emit(PipelineEvent::FlowCompleted {
                    invocation_id,
                    task: task.name().to_string(),
                    elapsed_ms,
                    timestamp: Utc::now(),
                });
            }
            Err(e) => {
                warn!(task = task.name(), %invocation_id, kind = %e.kind(), error = %e, "Flow failed");
                self.emit(PipelineEvent::FlowFailed {
                    invocation_id,
                    task: task.name().to_string(),
                    kind: e.kind().to_string(),
                    message: e.to_string(),
                    timestamp: Utc::now(),
                });
            }
        }
        outcome
    }

    async fn invoke(
        &self,
        task: &TaskDefinition,
        input: &InputRecord,
        deadline: &Deadline,
    ) -> Result<OutputRecord, PipelineError> {
        let credential = self.credentials.resolve(input.credential())?;
        let request = GenerateRequest {
            task: task.name().to_string(),
            prompt: task.render(input),
            output: task.model_output().clone(),
        };

        let raw = deadline
            .run(task.name(), async {
                self.backend
                    .generate(&request, &credential)
                    .await
                    .map_err(PipelineError::from)
            })
            .await?;

        task.validate_output(raw)
    }

    fn emit(&self, event: PipelineEvent) {
        if let Some(bus) = &self.events {
            bus.emit_lossy(event);
        }
    }
}
