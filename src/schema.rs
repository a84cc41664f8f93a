//! Coerce loosely-shaped model JSON into the resume scoring contract.
//!
//! Every field degrades toward an empty/default value on its own, except the
//! score: without a numeric score the result is meaningless and coercion fails.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::normalize::json_type_name;

/// Number of strengths and gaps kept from the model output.
pub const FINDINGS_LIMIT: usize = 3;
pub const SCORE_MIN: u8 = 0;
pub const SCORE_MAX: u8 = 100;

pub const STRENGTH_PLACEHOLDER: &str = "Strength";
pub const GAP_PLACEHOLDER: &str = "Gap";

/// A titled observation about the CV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub title: String,
    pub description: String,
}

impl Finding {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Validated resume scoring result.
///
/// `score` is always within [0, 100] and `strengths`/`gaps` never hold more
/// than three entries. Fewer than three is accepted and not padded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeScore {
    pub score: u8,
    pub strengths: Vec<Finding>,
    pub gaps: Vec<Finding>,
    pub suggestions: Vec<String>,
}

/// The one unrecoverable coercion failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoerceError {
    #[error("missing numeric score ({0})")]
    MissingScore(String),
}

/// Structured output contracts known to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    ResumeScore,
}

impl Schema {
    pub fn name(&self) -> &'static str {
        match self {
            Schema::ResumeScore => "resume_score",
        }
    }
}

pub fn coerce_resume_score(parsed: &Map<String, Value>) -> Result<ResumeScore, CoerceError> {
    Ok(ResumeScore {
        score: coerce_score(parsed.get("score"))?,
        strengths: coerce_findings(parsed.get("strengths"), STRENGTH_PLACEHOLDER),
        gaps: coerce_findings(parsed.get("gaps"), GAP_PLACEHOLDER),
        suggestions: coerce_strings(parsed.get("suggestions")),
    })
}

/// Round to the nearest integer (ties to even, as Python's `round`), then
/// clamp into [0, 100].
pub fn coerce_score(value: Option<&Value>) -> Result<u8, CoerceError> {
    let raw = match value {
        None => return Err(CoerceError::MissingScore("absent".to_string())),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| CoerceError::MissingScore(format!("unrepresentable number {n}")))?,
        Some(other) => {
            return Err(CoerceError::MissingScore(format!(
                "got {}",
                json_type_name(other)
            )))
        }
    };

    let clamped = raw.round_ties_even().clamp(f64::from(SCORE_MIN), f64::from(SCORE_MAX));
    Ok(clamped as u8)
}

/// Take the first three entries, then skip any that are not objects.
pub fn coerce_findings(value: Option<&Value>, placeholder: &str) -> Vec<Finding> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };

    items
        .iter()
        .take(FINDINGS_LIMIT)
        .filter_map(Value::as_object)
        .map(|item| {
            let title = item
                .get("title")
                .and_then(Value::as_str)
                .filter(|t| !t.trim().is_empty())
                .unwrap_or(placeholder);
            let description = item
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or_default();
            Finding::new(title, description)
        })
        .collect()
}

/// Keep string elements in order; everything else is dropped.
pub fn coerce_strings(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect()
}
