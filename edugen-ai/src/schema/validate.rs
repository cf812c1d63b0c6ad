//! Validation of JSON values against a [`Schema`]
//!
//! The contract is compiled to JSON Schema and checked with `jsonschema`.
//! A thin pass before the check fills declared defaults, drops optional
//! nulls and turns integral floats into integers.

use super::{ObjectSchema, Origin, Presence, Schema, ValidationError};
use jsonschema::error::ValidationErrorKind;
use jsonschema::Validator;
use serde_json::{Map, Value};

/// Validate a request object, applying declared defaults
pub fn validate_input(
    schema: &ObjectSchema,
    raw: &Value,
) -> Result<Map<String, Value>, ValidationError> {
    let schema = Schema::Object(schema.clone());
    match check(Origin::Input, &schema, raw)? {
        Value::Object(values) => Ok(values),
        other => Err(ValidationError::new(Origin::Input, "$", "object", shape_of(&other))),
    }
}

/// Validate a parsed model output against the full output schema
pub fn validate_output(schema: &Schema, raw: &Value) -> Result<Value, ValidationError> {
    check(Origin::Output, schema, raw)
}

/// Turn the text a model produced into a JSON value
///
/// Tolerates a surrounding Markdown code fence. A plain-text answer is
/// accepted only when the expected output is itself a string, and then any
/// answer that is not a JSON string is taken verbatim.
pub fn parse_model_output(schema: &Schema, text: &str) -> Result<Value, ValidationError> {
    let body = strip_code_fence(text.trim());
    if *schema == Schema::String {
        return Ok(match serde_json::from_str::<Value>(body) {
            Ok(Value::String(answer)) => Value::String(answer),
            _ => Value::String(body.to_string()),
        });
    }
    serde_json::from_str::<Value>(body).map_err(|e| {
        ValidationError::new(
            Origin::Output,
            "$",
            format!("JSON {}", schema.describe()),
            format!("unparsable text ({})", e),
        )
    })
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // The info string (json, JSON, text, ...) runs to the end of the opening line
    let rest = rest.split_once('\n').map_or(rest, |(_, body)| body);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Short description of what a value actually is
pub(crate) fn shape_of(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean {}", b),
        Value::Number(n) if n.is_i64() || n.is_u64() => format!("integer {}", n),
        Value::Number(n) => format!("number {}", n),
        Value::String(s) => {
            let mut preview: String = s.chars().take(40).collect();
            if preview.len() < s.len() {
                preview.push('…');
            }
            format!("string {:?}", preview)
        }
        Value::Array(items) => format!("array of {} item(s)", items.len()),
        Value::Object(_) => "object".to_string(),
    }
}

fn check(origin: Origin, schema: &Schema, raw: &Value) -> Result<Value, ValidationError> {
    let document = normalize(schema, raw);
    let validator = Validator::new(&schema.to_json_schema()).map_err(|e| {
        ValidationError::new(origin, "$", "a well-formed contract", e.to_string())
    })?;

    if let Err(error) = validator.validate(&document) {
        return Err(report(origin, schema, &document, &error));
    }
    Ok(document)
}

/// Fill defaults, drop optional nulls and coerce integral floats
///
/// Anything that does not match its schema node is left alone for the
/// validator to report.
fn normalize(schema: &Schema, value: &Value) -> Value {
    match (schema, value) {
        (Schema::Integer { .. }, Value::Number(n)) if !(n.is_i64() || n.is_u64()) => n
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15)
            .map_or_else(|| value.clone(), |f| Value::from(f as i64)),
        (Schema::Array(item), Value::Array(items)) => {
            Value::Array(items.iter().map(|v| normalize(item, v)).collect())
        }
        (Schema::Object(object), Value::Object(fields)) => {
            let mut out = fields.clone();
            for field in object.fields() {
                match (fields.get(&field.name), &field.presence) {
                    (None | Some(Value::Null), Presence::Optional) => {
                        out.remove(&field.name);
                    }
                    (None | Some(Value::Null), Presence::Default(default)) => {
                        out.insert(field.name.clone(), default.clone());
                    }
                    (Some(v), _) => {
                        out.insert(field.name.clone(), normalize(&field.schema, v));
                    }
                    (None, Presence::Required) => {}
                }
            }
            Value::Object(out)
        }
        _ => value.clone(),
    }
}

/// Where a validation error points, tracked through schema and document
struct Cursor<'a> {
    path: String,
    schema: Option<&'a Schema>,
    value: Option<&'a Value>,
}

impl<'a> Cursor<'a> {
    fn step(self, token: &str) -> Cursor<'a> {
        match self.value {
            Some(Value::Array(items)) => {
                let index = token.parse::<usize>().ok();
                Cursor {
                    path: format!("{}[{}]", self.path, token),
                    schema: match self.schema {
                        Some(Schema::Array(item)) => Some(item.as_ref()),
                        _ => None,
                    },
                    value: index.and_then(|i| items.get(i)),
                }
            }
            value => Cursor {
                path: format!("{}.{}", self.path, token),
                schema: match self.schema {
                    Some(Schema::Object(object)) => object.field(token).map(|f| &f.schema),
                    _ => None,
                },
                value: value.and_then(|v| v.get(token)),
            },
        }
    }

    fn expected(&self) -> String {
        self.schema
            .map(Schema::describe)
            .unwrap_or_else(|| "no such field".to_string())
    }

    fn actual(&self) -> String {
        self.value.map(shape_of).unwrap_or_else(|| "nothing".to_string())
    }
}

fn report(
    origin: Origin,
    schema: &Schema,
    document: &Value,
    error: &jsonschema::ValidationError<'_>,
) -> ValidationError {
    let pointer = error.instance_path.to_string();
    let at = pointer
        .split('/')
        .skip(1)
        .map(|token| token.replace("~1", "/").replace("~0", "~"))
        .fold(
            Cursor {
                path: "$".to_string(),
                schema: Some(schema),
                value: Some(document),
            },
            |cursor, token| cursor.step(&token),
        );

    match &error.kind {
        ValidationErrorKind::Required { property } => {
            let missing = at.step(property.as_str().unwrap_or_default());
            ValidationError::new(origin, missing.path.clone(), missing.expected(), "nothing")
        }
        ValidationErrorKind::AdditionalProperties { unexpected } => {
            let extra = at.step(unexpected.first().map(String::as_str).unwrap_or_default());
            ValidationError::new(origin, extra.path, "no such field", "an undeclared field")
        }
        _ => ValidationError::new(origin, at.path.clone(), at.expected(), at.actual()),
    }
}
