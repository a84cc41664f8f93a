//! Ollama adapter for single-shot text generation.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use super::error::TransportError;
use super::types::*;

// =============================================================================
// TRAIT
// =============================================================================

/// Trait for text generation providers.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    async fn generate(&self, req: &GenerateRequest) -> Result<GenerateResponse, TransportError>;

    /// Model identifier this provider is pinned to.
    fn model(&self) -> &str;
}

// =============================================================================
// CONFIG
// =============================================================================

pub const DEFAULT_BASE_URL: &str = "http://ollama:11434";
pub const DEFAULT_MODEL: &str = "qwen2.5:7b";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Maximum allowed reply body length (1MB).
const MAX_RESPONSE_LEN: usize = 1_024 * 1_024;

/// Bytes of a non-2xx body read before giving up on the rest. Enough for
/// `MAX_ERROR_BODY_CHARS` characters plus leading whitespace.
const ERROR_SNIPPET_LEN: usize = 4 * 1_024;

/// Connection settings for the generation backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl OllamaConfig {
    /// Read `OLLAMA_BASE_URL`, `OLLAMA_MODEL` and `OLLAMA_TIMEOUT_SECONDS`,
    /// falling back to defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let base_url = lookup("OLLAMA_BASE_URL")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.base_url);

        let model = lookup("OLLAMA_MODEL")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.model);

        let timeout = lookup("OLLAMA_TIMEOUT_SECONDS")
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);

        Self {
            base_url,
            model,
            timeout,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// =============================================================================
// OLLAMA ADAPTER
// =============================================================================

/// Ollama `/api/generate` adapter.
#[derive(Debug, Clone)]
pub struct OllamaAdapter {
    client: reqwest::Client,
    config: OllamaConfig,
}

impl OllamaAdapter {
    /// Create from environment variables.
    pub fn from_env() -> Result<Self, TransportError> {
        Self::new(OllamaConfig::from_env())
    }

    /// Create with explicit configuration.
    pub fn new(config: OllamaConfig) -> Result<Self, TransportError> {
        if config.base_url.trim().is_empty() {
            return Err(TransportError::config("base URL must be non-empty"));
        }
        if config.model.trim().is_empty() {
            return Err(TransportError::config("model must be non-empty"));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| TransportError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.config.base_url.trim_end_matches('/'))
    }

    /// Map a reqwest failure to the transport taxonomy.
    fn classify(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            return TransportError::Timeout(self.config.timeout);
        }
        TransportError::unavailable(format!(
            "backend unreachable at {} (model {}): {err}",
            self.config.base_url, self.config.model
        ))
    }
}

// =============================================================================
// API TYPES
// =============================================================================

#[derive(Serialize)]
struct GenerateApiRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<ApiOptions>,
}

#[derive(Serialize)]
struct ApiOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateApiResponse {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
    #[serde(default)]
    done_reason: Option<String>,
}

// =============================================================================
// GENERATION PROVIDER IMPL
// =============================================================================

#[async_trait]
impl GenerationProvider for OllamaAdapter {
    async fn generate(&self, req: &GenerateRequest) -> Result<GenerateResponse, TransportError> {
        let start = Instant::now();

        let api_req = GenerateApiRequest {
            model: &self.config.model,
            prompt: &req.prompt,
            stream: false,
            format: req.json_mode.then_some("json"),
            options: req.temperature.map(|temperature| ApiOptions { temperature }),
        };

        let mut response = self
            .client
            .post(self.generate_url())
            .json(&api_req)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();

        if !status.is_success() {
            // Only a snippet is reported, so the rest of the body is never read.
            let mut bytes = Vec::new();
            while bytes.len() < ERROR_SNIPPET_LEN {
                match response.chunk().await {
                    Ok(Some(chunk)) => bytes.extend_from_slice(&chunk),
                    Ok(None) | Err(_) => break,
                }
            }
            bytes.truncate(ERROR_SNIPPET_LEN);
            let body = String::from_utf8_lossy(&bytes);
            return Err(TransportError::rejected(status.as_u16(), &body));
        }

        // Stream response to enforce size limit
        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| self.classify(e))? {
            let new_len = bytes.len() + chunk.len();
            if new_len > MAX_RESPONSE_LEN {
                return Err(TransportError::unavailable(format!(
                    "reply too large: {new_len} bytes (max {MAX_RESPONSE_LEN})"
                )));
            }
            bytes.extend_from_slice(&chunk);
        }

        let body = String::from_utf8_lossy(&bytes);

        let parsed: GenerateApiResponse = serde_json::from_str(&body).map_err(|e| {
            TransportError::unavailable(format!(
                "unreadable reply from {} (model {}): {e}",
                self.config.base_url, self.config.model
            ))
        })?;

        Ok(GenerateResponse {
            text: parsed.response.unwrap_or_default(),
            prompt_tokens: parsed.prompt_eval_count.unwrap_or(0),
            output_tokens: parsed.eval_count.unwrap_or(0),
            latency: start.elapsed(),
            done_reason: DoneReason::from(parsed.done_reason),
        })
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}
