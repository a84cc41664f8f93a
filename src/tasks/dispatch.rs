//! Runs a registered task against the generation backend.

use tracing::{debug, warn, Instrument};
use uuid::Uuid;

use crate::error::TaskError;
use crate::gateway::error::truncate_chars;
use crate::gateway::{Attribution, GenerateRequest, TextGenerator};
use crate::normalize::extract_json;
use crate::prompts::TaskParams;
use crate::schema::{coerce_resume_score, Schema};

use super::registry::{OutputKind, TaskHandler, TaskRegistry};
use super::{TaskOutput, TaskRequest, TaskStage};

/// Characters of model text kept in malformed-output log events.
const RAW_PREVIEW_CHARS: usize = 200;

/// Task dispatcher. Holds no per-request state; one instance serves
/// concurrent requests.
pub struct Dispatcher<G: TextGenerator> {
    registry: TaskRegistry,
    generator: G,
}

impl<G: TextGenerator> Dispatcher<G> {
    pub fn new(generator: G) -> Self {
        Self::with_registry(TaskRegistry::default(), generator)
    }

    pub fn with_registry(registry: TaskRegistry, generator: G) -> Self {
        Self {
            registry,
            generator,
        }
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    /// Dispatch a validated request.
    pub async fn run(&self, req: &TaskRequest) -> Result<TaskOutput, TaskError> {
        self.dispatch(req.name(), req.params()).await
    }

    /// Dispatch by name. `name` is expected to be trimmed and non-empty;
    /// matching is exact.
    pub async fn dispatch(&self, name: &str, params: &TaskParams) -> Result<TaskOutput, TaskError> {
        let handler = match self.registry.get(name) {
            Some(handler) => handler,
            None => {
                warn!(task = name, error = "unknown_task", "dispatch rejected");
                return Err(TaskError::UnknownTask(name.to_string()));
            }
        };

        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("dispatch", task = handler.name(), %request_id);
        self.execute(handler, params, request_id)
            .instrument(span)
            .await
            .map_err(|(stage, err)| {
                warn!(
                    stage = %TaskStage::Failed,
                    failed_at = %stage,
                    error = err.code(),
                    detail = %err,
                    "task failed"
                );
                err
            })
    }

    /// Send a raw prompt to the backend and return its text.
    pub async fn ask(&self, prompt: &str) -> Result<String, TaskError> {
        let req = GenerateRequest::new(prompt, Attribution::new("dispatcher::ask"));
        self.generator.generate(req).await.map_err(|err| {
            let err = TaskError::from(err);
            warn!(error = err.code(), detail = %err, "ask failed");
            err
        })
    }

    async fn execute(
        &self,
        handler: &TaskHandler,
        params: &TaskParams,
        request_id: Uuid,
    ) -> Result<TaskOutput, (TaskStage, TaskError)> {
        debug!(stage = %TaskStage::Received);

        let prompt = (handler.build_prompt)(params);
        debug!(
            stage = %TaskStage::PromptBuilt,
            template = prompt.template_slug,
            prompt_chars = prompt.text.chars().count()
        );

        let mut req = GenerateRequest::new(
            prompt.text,
            Attribution::new(handler.name()).with_request_id(request_id),
        );
        if handler.is_structured() {
            req = req.json();
        }
        if let Some(t) = handler.temperature {
            req = req.temperature(t);
        }

        let text = self
            .generator
            .generate(req)
            .await
            .map_err(|e| (TaskStage::Generated, TaskError::from(e)))?;
        debug!(stage = %TaskStage::Generated, reply_chars = text.chars().count());

        let output = match handler.output {
            OutputKind::FreeText => TaskOutput::Text { result: text },
            OutputKind::Structured(schema) => {
                let parsed = extract_json(&text).map_err(|e| {
                    debug!(raw = %truncate_chars(&text, RAW_PREVIEW_CHARS), "unparsable reply");
                    (TaskStage::Normalized, TaskError::from(e))
                })?;
                debug!(stage = %TaskStage::Normalized, fields = parsed.len());

                let output = match schema {
                    Schema::ResumeScore => coerce_resume_score(&parsed)
                        .map(TaskOutput::ResumeScore)
                        .map_err(|e| (TaskStage::Coerced, TaskError::from(e)))?,
                };
                debug!(stage = %TaskStage::Coerced, schema = schema.name());
                output
            }
        };

        debug!(stage = %TaskStage::Done);
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{GenerationOutcome, TransportError};
    use serde_json::json;
    use std::sync::Mutex;

    /// Replies with a fixed outcome and remembers the requests it saw.
    struct Scripted {
        reply: fn() -> GenerationOutcome,
        seen: Mutex<Vec<GenerateRequest>>,
    }

    impl Scripted {
        fn new(reply: fn() -> GenerationOutcome) -> Self {
            Self {
                reply,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl TextGenerator for Scripted {
        async fn generate(&self, req: GenerateRequest) -> GenerationOutcome {
            self.seen.lock().unwrap().push(req);
            (self.reply)()
        }
    }

    fn params(v: serde_json::Value) -> TaskParams {
        v.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn unknown_task_never_reaches_backend() {
        let dispatcher = Dispatcher::new(Scripted::new(|| Ok("unused".into())));
        let err = dispatcher
            .dispatch("unknown_xyz", &params(json!({"cvText": "x"})))
            .await
            .unwrap_err();
        assert_eq!(err, TaskError::UnknownTask("unknown_xyz".into()));
        assert!(dispatcher.generator.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn free_text_is_returned_verbatim() {
        let dispatcher = Dispatcher::new(Scripted::new(|| Ok("  ```not json```  ".into())));
        let out = dispatcher
            .dispatch("cover_letter", &TaskParams::new())
            .await
            .unwrap();
        assert_eq!(out.as_text(), Some("  ```not json```  "));

        let seen = dispatcher.generator.seen.lock().unwrap();
        assert!(!seen[0].json_mode);
        assert_eq!(seen[0].attribution.caller, "cover_letter");
    }

    #[tokio::test]
    async fn empty_free_text_is_allowed() {
        let dispatcher = Dispatcher::new(Scripted::new(|| Ok(String::new())));
        let out = dispatcher
            .dispatch("cover_letter", &TaskParams::new())
            .await
            .unwrap();
        assert_eq!(out.as_text(), Some(""));
    }

    #[tokio::test]
    async fn structured_tasks_request_json_mode() {
        let dispatcher = Dispatcher::new(Scripted::new(|| Ok(r#"{"score": 50}"#.into())));
        dispatcher
            .dispatch("resume_scoring", &TaskParams::new())
            .await
            .unwrap();
        let seen = dispatcher.generator.seen.lock().unwrap();
        assert!(seen[0].json_mode);
        assert_eq!(seen[0].temperature, Some(0.4));
    }

    #[tokio::test]
    async fn timeout_is_not_reported_as_malformed() {
        let dispatcher = Dispatcher::new(Scripted::new(|| {
            Err(TransportError::Timeout(std::time::Duration::from_secs(120)))
        }));
        let err = dispatcher
            .dispatch("resume_scoring", &TaskParams::new())
            .await
            .unwrap_err();
        assert_eq!(err, TaskError::UpstreamTimeout);
    }

    #[tokio::test]
    async fn empty_structured_reply_is_malformed() {
        let dispatcher = Dispatcher::new(Scripted::new(|| Ok(String::new())));
        let err = dispatcher
            .dispatch("resume_scoring", &TaskParams::new())
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::MalformedOutput(_)));
    }

    #[tokio::test]
    async fn ask_passes_prompt_through() {
        let dispatcher = Dispatcher::new(Scripted::new(|| Ok("42".into())));
        assert_eq!(dispatcher.ask("meaning of life?").await.unwrap(), "42");
        let seen = dispatcher.generator.seen.lock().unwrap();
        assert_eq!(seen[0].prompt, "meaning of life?");
        assert_eq!(seen[0].attribution.caller, "dispatcher::ask");
    }

    #[tokio::test]
    async fn ask_translates_transport_errors() {
        let dispatcher =
            Dispatcher::new(Scripted::new(|| Err(TransportError::rejected(404, "no model"))));
        let err = dispatcher.ask("hi").await.unwrap_err();
        assert_eq!(
            err,
            TaskError::UpstreamRejected {
                status: 404,
                body: "no model".into()
            }
        );
    }
}
