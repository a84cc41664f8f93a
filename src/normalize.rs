//! Extract a JSON object from raw model text.
//!
//! The backend is told to answer with a bare JSON object but often wraps it in a
//! markdown fence. One optional leading fence (with an optional language tag) and
//! one optional trailing fence are stripped; nothing else is repaired.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

static LEADING_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^```[A-Za-z0-9_+.\-]*\s*").expect("Invalid leading fence regex"));
static TRAILING_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*```$").expect("Invalid trailing fence regex"));

/// Why model text could not be turned into a JSON object.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("empty response from model")]
    Empty,
    #[error("invalid JSON in model response: {0}")]
    Syntax(String),
    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// Strip an optional surrounding code fence and trim whitespace.
pub fn strip_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let start = LEADING_FENCE.find(trimmed).map_or(0, |m| m.end());
    let body = &trimmed[start..];
    let end = TRAILING_FENCE.find(body).map_or(body.len(), |m| m.start());
    body[..end].trim()
}

/// Parse model text into a JSON object.
///
/// Guarantees only syntactic validity; field shapes are checked by the
/// schema coercer.
pub fn extract_json(raw: &str) -> Result<Map<String, Value>, NormalizeError> {
    if raw.trim().is_empty() {
        return Err(NormalizeError::Empty);
    }

    let body = strip_fences(raw);
    let value: Value =
        serde_json::from_str(body).map_err(|e| NormalizeError::Syntax(e.to_string()))?;

    match value {
        Value::Object(map) => Ok(map),
        other => Err(NormalizeError::NotAnObject(json_type_name(&other))),
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
