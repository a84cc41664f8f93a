//! Usage tracking via the UsageSink trait.
//!
//! The gateway logs every backend call through a UsageSink. This decouples the
//! gateway from where usage ends up:
//! - The CLI uses TracingUsageSink
//! - Tests use NoopUsageSink or a recording sink

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Status of a backend call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStatus {
    Success,
    Error,
}

impl CallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallStatus::Success => "success",
            CallStatus::Error => "error",
        }
    }
}

/// Record of a backend call for logging.
#[derive(Debug, Clone)]
pub struct ProviderCallRecord {
    /// Backend name, e.g. "ollama".
    pub provider: &'static str,
    /// Endpoint path, e.g. "api/generate".
    pub endpoint: &'static str,
    /// Model used.
    pub model: String,
    /// Prompt tokens evaluated.
    pub input_tokens: u32,
    /// Output tokens generated.
    pub output_tokens: u32,
    /// Dispatch this call belongs to.
    pub request_id: Uuid,
    /// Latency in milliseconds.
    pub latency_ms: u64,
    /// Call status.
    pub status: CallStatus,
    /// Error code if status is Error.
    pub error_code: Option<&'static str>,
    /// Which code path made this call.
    pub caller: &'static str,
    /// When the call was made.
    pub timestamp: DateTime<Utc>,
}

impl ProviderCallRecord {
    /// Create a new record with required fields, defaulting others.
    pub fn new(
        provider: &'static str,
        endpoint: &'static str,
        model: impl Into<String>,
        caller: &'static str,
        request_id: Uuid,
    ) -> Self {
        Self {
            provider,
            endpoint,
            model: model.into(),
            input_tokens: 0,
            output_tokens: 0,
            request_id,
            latency_ms: 0,
            status: CallStatus::Success,
            error_code: None,
            caller,
            timestamp: Utc::now(),
        }
    }

    pub fn tokens(mut self, input: u32, output: u32) -> Self {
        self.input_tokens = input;
        self.output_tokens = output;
        self
    }

    pub fn latency(mut self, ms: u64) -> Self {
        self.latency_ms = ms;
        self
    }

    pub fn error(mut self, code: &'static str) -> Self {
        self.status = CallStatus::Error;
        self.error_code = Some(code);
        self
    }
}

/// Trait for recording backend call usage.
///
/// Implement this trait to customize where usage data is stored.
#[async_trait]
pub trait UsageSink: Send + Sync {
    /// Record a backend call. This should be fire-and-forget:
    /// failures should be logged but not propagated.
    async fn record(&self, record: ProviderCallRecord);
}

/// No-op usage sink that discards all records.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopUsageSink;

#[async_trait]
impl UsageSink for NoopUsageSink {
    async fn record(&self, _record: ProviderCallRecord) {}
}

/// Usage sink that emits one `tracing` event per call.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingUsageSink;

#[async_trait]
impl UsageSink for TracingUsageSink {
    async fn record(&self, record: ProviderCallRecord) {
        tracing::info!(
            provider = record.provider,
            endpoint = record.endpoint,
            model = %record.model,
            caller = record.caller,
            request_id = %record.request_id,
            tokens = record.input_tokens + record.output_tokens,
            latency_ms = record.latency_ms,
            status = record.status.as_str(),
            error_code = record.error_code.unwrap_or(""),
            "backend call"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_builder_marks_errors() {
        let rec = ProviderCallRecord::new("ollama", "api/generate", "m", "test", Uuid::nil())
            .tokens(3, 4)
            .latency(12)
            .error("timeout");
        assert_eq!(rec.status, CallStatus::Error);
        assert_eq!(rec.error_code, Some("timeout"));
        assert_eq!(rec.input_tokens + rec.output_tokens, 7);
        assert_eq!(rec.latency_ms, 12);
    }
}
