//! Prompt templates
//!
//! Supported syntax:
//! - `{{name}}`, `{{{name}}}`, `{{a.b}}` substitute a value (no escaping)
//! - `{{this}}`, `{{this.field}}` refer to the current `#each` item
//! - `{{#each list}}…{{/each}}` repeats its body per array element
//! - `{{#if name}}…{{else}}…{{/if}}` renders on truthiness
//!
//! Names resolve in the innermost scope first and then outward, so a loop
//! body can still reach top-level fields. Absent values render as nothing.
//! Templates are parsed once; rendering cannot fail.

mod parser;

use parser::{Node, Path};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TemplateError {
    #[error("tag at byte {offset} is never closed")]
    Unterminated { offset: usize },

    #[error("empty tag at byte {offset}")]
    EmptyTag { offset: usize },

    #[error("invalid path `{path}` at byte {offset}")]
    BadPath { path: String, offset: usize },

    #[error("unknown block helper `{helper}` at byte {offset}")]
    UnknownHelper { helper: String, offset: usize },

    #[error("`{{{{else}}}}` outside an `if` block at byte {offset}")]
    StrayElse { offset: usize },

    #[error("`{{{{/{found}}}}}` at byte {offset} does not close {}", .expected.as_deref().unwrap_or("any block"))]
    Unbalanced {
        expected: Option<String>,
        found: String,
        offset: usize,
    },

    #[error("`{{{{#{helper}}}}}` opened at byte {offset} is never closed")]
    Unclosed { helper: String, offset: usize },

    #[error("template refers to `{field}`, which the input contract does not declare")]
    UnknownField { field: String },
}

/// A parsed prompt template
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    source: String,
    nodes: Vec<Node>,
}

impl Template {
    pub fn parse(source: impl Into<String>) -> Result<Self, TemplateError> {
        let source = source.into();
        let nodes = parser::parse(&source)?;
        Ok(Self { source, nodes })
    }

    /// Render against a JSON context. Pure and deterministic.
    pub fn render(&self, context: &Value) -> String {
        let mut out = String::with_capacity(self.source.len());
        let mut scopes = vec![context];
        render_nodes(&self.nodes, &mut scopes, &mut out);
        out
    }

    /// Top-level field names referenced outside any `#each` body
    pub fn root_fields(&self) -> Vec<&str> {
        let mut fields = Vec::new();
        collect_root_fields(&self.nodes, &mut fields);
        fields.sort_unstable();
        fields.dedup();
        fields
    }
}

fn collect_root_fields<'a>(nodes: &'a [Node], fields: &mut Vec<&'a str>) {
    fn note<'a>(path: &'a Path, fields: &mut Vec<&'a str>) {
        if !path.this {
            if let Some(first) = path.segments.first() {
                fields.push(first.as_str());
            }
        }
    }
    for node in nodes {
        match node {
            Node::Text(_) => {}
            Node::Value(path) => note(path, fields),
            Node::Each { path, .. } => note(path, fields),
            Node::If {
                path,
                then,
                otherwise,
            } => {
                note(path, fields);
                collect_root_fields(then, fields);
                collect_root_fields(otherwise, fields);
            }
        }
    }
}

fn render_nodes<'v>(nodes: &[Node], scopes: &mut Vec<&'v Value>, out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Value(path) => {
                if let Some(value) = lookup(path, scopes) {
                    write_value(value, out);
                }
            }
            Node::Each { path, body } => {
                if let Some(Value::Array(items)) = lookup(path, scopes) {
                    for item in items {
                        scopes.push(item);
                        render_nodes(body, scopes, out);
                        scopes.pop();
                    }
                }
            }
            Node::If {
                path,
                then,
                otherwise,
            } => {
                let branch = if lookup(path, scopes).is_some_and(truthy) {
                    then
                } else {
                    otherwise
                };
                render_nodes(branch, scopes, out);
            }
        }
    }
}

fn lookup<'v>(path: &Path, scopes: &[&'v Value]) -> Option<&'v Value> {
    let descend = |start: &'v Value| {
        path.segments
            .iter()
            .try_fold(start, |value, segment| value.get(segment.as_str()))
    };
    if path.this {
        return scopes.last().copied().and_then(descend);
    }
    scopes.iter().rev().copied().find_map(descend)
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(_) => true,
    }
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Null => {}
        Value::String(s) => out.push_str(s),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(item, out);
            }
        }
        Value::Object(_) => out.push_str(&value.to_string()),
    }
}
