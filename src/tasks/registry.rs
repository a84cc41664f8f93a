//! Registry mapping task names to handlers.

use std::collections::HashMap;

use crate::prompts::{cover_letter_prompt, resume_scoring_prompt, PromptInstance, TaskParams};
use crate::schema::Schema;

pub type PromptBuilder = fn(&TaskParams) -> PromptInstance;

/// What the pipeline does with the model text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// Return the text unchanged.
    FreeText,
    /// Extract a JSON object and coerce it into the schema.
    Structured(Schema),
}

/// The closed set of registered tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    CoverLetter,
    ResumeScoring,
}

impl TaskKind {
    pub const ALL: [TaskKind; 2] = [TaskKind::CoverLetter, TaskKind::ResumeScoring];

    pub fn name(&self) -> &'static str {
        match self {
            TaskKind::CoverLetter => "cover_letter",
            TaskKind::ResumeScoring => "resume_scoring",
        }
    }

    pub fn handler(self) -> TaskHandler {
        match self {
            TaskKind::CoverLetter => TaskHandler {
                kind: self,
                build_prompt: cover_letter_prompt,
                output: OutputKind::FreeText,
                temperature: None,
            },
            TaskKind::ResumeScoring => TaskHandler {
                kind: self,
                build_prompt: resume_scoring_prompt,
                output: OutputKind::Structured(Schema::ResumeScore),
                temperature: Some(0.4),
            },
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TaskHandler {
    pub kind: TaskKind,
    pub build_prompt: PromptBuilder,
    pub output: OutputKind,
    /// Sampling temperature sent with the generation request, if any.
    pub temperature: Option<f32>,
}

impl TaskHandler {
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn is_structured(&self) -> bool {
        matches!(self.output, OutputKind::Structured(_))
    }
}

/// Read-only after construction; safe to share across concurrent requests.
#[derive(Debug, Clone)]
pub struct TaskRegistry {
    handlers: HashMap<&'static str, TaskHandler>,
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::with_kinds(&TaskKind::ALL)
    }
}

impl TaskRegistry {
    pub fn with_kinds(kinds: &[TaskKind]) -> Self {
        let handlers = kinds
            .iter()
            .map(|kind| (kind.name(), kind.handler()))
            .collect();
        Self { handlers }
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut keys: Vec<&'static str> = self.handlers.keys().copied().collect();
        keys.sort_unstable();
        keys
    }

    /// Exact, case-sensitive lookup.
    pub fn get(&self, name: &str) -> Option<&TaskHandler> {
        self.handlers.get(name)
    }
}
