//! Provider gateway for the text-generation backend.

pub mod error;
pub mod ollama;
pub mod types;
pub mod usage;

use std::sync::Arc;

use tracing::{debug, warn};

use ollama::{GenerationProvider, OllamaAdapter};
use usage::{ProviderCallRecord, UsageSink as UsageSinkTrait};

pub use error::{TransportError, MAX_ERROR_BODY_CHARS};
pub use ollama::OllamaConfig;
pub use types::*;
pub use usage::{NoopUsageSink, TracingUsageSink, UsageSink};

/// Result of one generation call: the reply text, or a classified failure.
pub type GenerationOutcome = Result<String, TransportError>;

/// The contract the task pipeline depends on.
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, req: GenerateRequest) -> GenerationOutcome;
}

/// Single-attempt gateway: one backend call per request, usage recorded on
/// every outcome. Retry policy, if any, belongs to the caller.
pub struct ProviderGateway<U: UsageSinkTrait> {
    provider: OllamaAdapter,
    usage_sink: Arc<U>,
}

#[async_trait::async_trait]
impl<U: UsageSinkTrait> TextGenerator for ProviderGateway<U> {
    async fn generate(&self, req: GenerateRequest) -> GenerationOutcome {
        ProviderGateway::generate(self, &req)
            .await
            .map(|resp| resp.text)
    }
}

impl<U: UsageSinkTrait> ProviderGateway<U> {
    pub fn from_env(usage_sink: Arc<U>) -> Result<Self, TransportError> {
        let provider = OllamaAdapter::from_env()?;
        Ok(Self::new(provider, usage_sink))
    }

    pub fn new(provider: OllamaAdapter, usage_sink: Arc<U>) -> Self {
        Self {
            provider,
            usage_sink,
        }
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    pub async fn generate(&self, req: &GenerateRequest) -> Result<GenerateResponse, TransportError> {
        let result = self.provider.generate(req).await;

        let record = ProviderCallRecord::new(
            "ollama",
            "api/generate",
            self.provider.model(),
            req.attribution.caller,
            req.attribution.request_id,
        );
        let record = match &result {
            Ok(resp) => {
                debug!(done_reason = ?resp.done_reason, "generation finished");
                if resp.done_reason == DoneReason::Length {
                    warn!(
                        caller = req.attribution.caller,
                        "reply cut off at the backend's token limit"
                    );
                }
                record
                    .tokens(resp.prompt_tokens, resp.output_tokens)
                    .latency(resp.latency.as_millis() as u64)
            }
            Err(err) => record.error(err.code()),
        };
        self.usage_sink.record(record).await;

        result
    }
}
