//! Task registry and dispatch.
//!
//! A task name resolves to a handler (prompt builder + output kind). The
//! dispatcher runs the pipeline:
//! prompt → generate → (structured only) normalize → coerce.

pub mod dispatch;
pub mod registry;

use std::fmt;

use serde::Serialize;

use crate::error::TaskError;
use crate::prompts::TaskParams;
use crate::schema::ResumeScore;

pub use dispatch::Dispatcher;
pub use registry::{OutputKind, TaskHandler, TaskKind, TaskRegistry};

/// A validated inbound call.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRequest {
    name: String,
    params: TaskParams,
}

impl TaskRequest {
    /// Trims `name`; a blank name is rejected.
    pub fn new(name: impl AsRef<str>, params: TaskParams) -> Result<Self, TaskError> {
        let name = name.as_ref().trim();
        if name.is_empty() {
            return Err(TaskError::EmptyTaskName);
        }
        Ok(Self {
            name: name.to_string(),
            params,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &TaskParams {
        &self.params
    }
}

/// Successful task result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TaskOutput {
    /// Raw model text, possibly empty.
    Text { result: String },
    ResumeScore(ResumeScore),
}

impl TaskOutput {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            TaskOutput::Text { result } => Some(result),
            _ => None,
        }
    }

    pub fn as_resume_score(&self) -> Option<&ResumeScore> {
        match self {
            TaskOutput::ResumeScore(score) => Some(score),
            _ => None,
        }
    }
}

/// Per-request pipeline stage. Any stage may transition to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStage {
    Received,
    PromptBuilt,
    Generated,
    Normalized,
    Coerced,
    Done,
    Failed,
}

impl TaskStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStage::Received => "received",
            TaskStage::PromptBuilt => "prompt_built",
            TaskStage::Generated => "generated",
            TaskStage::Normalized => "normalized",
            TaskStage::Coerced => "coerced",
            TaskStage::Done => "done",
            TaskStage::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Finding;
    use serde_json::json;

    #[test]
    fn request_name_is_trimmed() {
        let req = TaskRequest::new("  resume_scoring\n", TaskParams::new()).unwrap();
        assert_eq!(req.name(), "resume_scoring");
    }

    #[test]
    fn blank_request_name_is_rejected() {
        assert_eq!(
            TaskRequest::new("   ", TaskParams::new()),
            Err(TaskError::EmptyTaskName)
        );
        assert_eq!(
            TaskRequest::new("", TaskParams::new()),
            Err(TaskError::EmptyTaskName)
        );
    }

    #[test]
    fn output_serialization_shapes() {
        let text = TaskOutput::Text {
            result: "Dear team".into(),
        };
        assert_eq!(serde_json::to_value(&text).unwrap(), json!({"result": "Dear team"}));

        let score = TaskOutput::ResumeScore(ResumeScore {
            score: 80,
            strengths: vec![Finding::new("A", "d")],
            gaps: vec![],
            suggestions: vec!["x".into()],
        });
        assert_eq!(
            serde_json::to_value(&score).unwrap(),
            json!({
                "score": 80,
                "strengths": [{"title": "A", "description": "d"}],
                "gaps": [],
                "suggestions": ["x"],
            })
        );
    }

    #[test]
    fn stage_names() {
        assert_eq!(TaskStage::Failed.to_string(), "failed");
        assert_eq!(TaskStage::PromptBuilt.to_string(), "prompt_built");
    }
}
