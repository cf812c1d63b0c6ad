//! Schema contracts for task inputs and outputs
//!
//! A contract is a tree of [`Schema`] nodes. Objects are matched by field
//! name, never by position, so the order in which a model emits fields has
//! no effect on validation.

mod validate;

pub use validate::{parse_model_output, validate_input, validate_output};

use crate::credential::Credential;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::fmt;
use thiserror::Error;

/// Request field carrying a caller-supplied model credential
pub const CREDENTIAL_FIELD: &str = "apiKey";

// ============================================================================
// Schema tree
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    String,
    /// Integer with optional inclusive bounds
    Integer {
        min: Option<i64>,
        max: Option<i64>,
    },
    Number,
    Boolean,
    /// String restricted to the listed values
    Enum(Vec<String>),
    Array(Box<Schema>),
    Object(ObjectSchema),
}

impl Schema {
    pub fn integer() -> Self {
        Schema::Integer { min: None, max: None }
    }

    pub fn positive_integer() -> Self {
        Schema::Integer {
            min: Some(1),
            max: None,
        }
    }

    pub fn integer_range(min: i64, max: i64) -> Self {
        Schema::Integer {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn one_of(values: &[&str]) -> Self {
        Schema::Enum(values.iter().map(|v| v.to_string()).collect())
    }

    pub fn array_of(item: Schema) -> Self {
        Schema::Array(Box::new(item))
    }

    /// Human-readable shape, used as the "expected" side of a validation error
    pub fn describe(&self) -> String {
        match self {
            Schema::String => "string".to_string(),
            Schema::Integer { min, max } => match (min, max) {
                (Some(lo), Some(hi)) => format!("integer in {}..={}", lo, hi),
                (Some(lo), None) => format!("integer >= {}", lo),
                (None, Some(hi)) => format!("integer <= {}", hi),
                (None, None) => "integer".to_string(),
            },
            Schema::Number => "number".to_string(),
            Schema::Boolean => "boolean".to_string(),
            Schema::Enum(values) => format!("one of [{}]", values.join(", ")),
            Schema::Array(item) => format!("array of {}", item.describe()),
            Schema::Object(_) => "object".to_string(),
        }
    }

    /// Standard JSON Schema (draft 2020-12) for this contract
    ///
    /// Objects are closed (`additionalProperties: false`). Fields with a
    /// default are listed as required because defaults are filled in before
    /// the document is checked.
    pub fn to_json_schema(&self) -> Value {
        match self {
            Schema::String => json!({"type": "string"}),
            Schema::Integer { min, max } => {
                let mut node = Map::new();
                node.insert("type".to_string(), json!("integer"));
                if let Some(lo) = min {
                    node.insert("minimum".to_string(), json!(lo));
                }
                if let Some(hi) = max {
                    node.insert("maximum".to_string(), json!(hi));
                }
                Value::Object(node)
            }
            Schema::Number => json!({"type": "number"}),
            Schema::Boolean => json!({"type": "boolean"}),
            Schema::Enum(values) => json!({"type": "string", "enum": values}),
            Schema::Array(item) => json!({"type": "array", "items": item.to_json_schema()}),
            Schema::Object(object) => {
                let mut properties = Map::new();
                let mut required = Vec::new();
                for field in object.fields() {
                    let mut property = field.schema.to_json_schema();
                    if let (Presence::Default(default), Value::Object(node)) =
                        (&field.presence, &mut property)
                    {
                        node.insert("default".to_string(), default.clone());
                    }
                    properties.insert(field.name.clone(), property);
                    if field.presence != Presence::Optional {
                        required.push(field.name.clone());
                    }
                }
                json!({
                    "type": "object",
                    "properties": properties,
                    "required": required,
                    "additionalProperties": false,
                })
            }
        }
    }
}

impl From<ObjectSchema> for Schema {
    fn from(object: ObjectSchema) -> Self {
        Schema::Object(object)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Presence {
    Required,
    Optional,
    /// Absent values are replaced by this default
    Default(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub schema: Schema,
    pub presence: Presence,
}

/// Named fields of an object, in declaration order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectSchema {
    fields: Vec<Field>,
}

impl ObjectSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(self, name: &str, schema: impl Into<Schema>) -> Self {
        self.push(name, schema.into(), Presence::Required)
    }

    pub fn optional(self, name: &str, schema: impl Into<Schema>) -> Self {
        self.push(name, schema.into(), Presence::Optional)
    }

    pub fn with_default(self, name: &str, schema: impl Into<Schema>, default: Value) -> Self {
        self.push(name, schema.into(), Presence::Default(default))
    }

    fn push(mut self, name: &str, schema: Schema, presence: Presence) -> Self {
        self.fields.retain(|f| f.name != name);
        self.fields.push(Field {
            name: name.to_string(),
            schema,
            presence,
        });
        self
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Copy of this schema with the named fields removed
    pub fn without(&self, names: &[&str]) -> ObjectSchema {
        ObjectSchema {
            fields: self
                .fields
                .iter()
                .filter(|f| !names.contains(&f.name.as_str()))
                .cloned()
                .collect(),
        }
    }
}

// ============================================================================
// Validation errors
// ============================================================================

/// Which side of a model call a value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Input,
    Output,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Input => f.write_str("input"),
            Origin::Output => f.write_str("output"),
        }
    }
}

/// A value that does not satisfy its contract
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{origin} field {path}: expected {expected}, found {actual}")]
pub struct ValidationError {
    pub origin: Origin,
    /// JSON path of the offending value, e.g. `$.quiz[2].options`
    pub path: String,
    pub expected: String,
    pub actual: String,
}

impl ValidationError {
    pub fn new(
        origin: Origin,
        path: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            origin,
            path: path.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

// ============================================================================
// Input contracts
// ============================================================================

/// Whether a task lets the caller supply its own model credential
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialPolicy {
    CallerMaySupply,
    /// Only the process default credential is ever used
    SystemOnly,
}

/// Input schema plus the credential-override rule of one operation
#[derive(Debug, Clone, PartialEq)]
pub struct InputContract {
    schema: ObjectSchema,
    credential_policy: CredentialPolicy,
}

impl InputContract {
    pub fn new(schema: ObjectSchema) -> Self {
        Self {
            schema,
            credential_policy: CredentialPolicy::CallerMaySupply,
        }
    }

    pub fn system_credential_only(mut self) -> Self {
        self.credential_policy = CredentialPolicy::SystemOnly;
        self
    }

    pub fn schema(&self) -> &ObjectSchema {
        &self.schema
    }

    pub fn credential_policy(&self) -> CredentialPolicy {
        self.credential_policy
    }

    /// Validate a raw request and split off its credential override
    ///
    /// An empty or null `apiKey` counts as absent. A non-empty one on a
    /// [`CredentialPolicy::SystemOnly`] contract is rejected rather than
    /// silently ignored.
    pub fn validate(&self, raw: Value) -> Result<InputRecord, ValidationError> {
        let mut object = match raw {
            Value::Object(object) => object,
            other => {
                return Err(ValidationError::new(
                    Origin::Input,
                    "$",
                    "object",
                    validate::shape_of(&other),
                ))
            }
        };

        let credential = match object.remove(CREDENTIAL_FIELD) {
            None | Some(Value::Null) => None,
            Some(Value::String(key)) if key.trim().is_empty() => None,
            Some(Value::String(key)) => {
                if self.credential_policy == CredentialPolicy::SystemOnly {
                    return Err(ValidationError::new(
                        Origin::Input,
                        format!("$.{}", CREDENTIAL_FIELD),
                        "no caller credential (this operation uses the service key)",
                        "a credential",
                    ));
                }
                Some(Credential::new(key.trim()))
            }
            Some(other) => {
                return Err(ValidationError::new(
                    Origin::Input,
                    format!("$.{}", CREDENTIAL_FIELD),
                    "string",
                    validate::shape_of(&other),
                ))
            }
        };

        let values = validate_input(&self.schema, &Value::Object(object))?;
        Ok(InputRecord { values, credential })
    }
}

/// Input values that satisfied their contract
#[derive(Debug, Clone, PartialEq)]
pub struct InputRecord {
    values: Map<String, Value>,
    credential: Option<Credential>,
}

impl InputRecord {
    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// Replace the credential override, e.g. to pass a parent call's key to a sub-flow
    pub fn with_credential(mut self, credential: Option<Credential>) -> Self {
        self.credential = credential;
        self
    }

    /// Values as a JSON object, the rendering context for prompts
    pub fn to_value(&self) -> Value {
        Value::Object(self.values.clone())
    }
}
