//! Core types for the generation gateway.

use std::time::Duration;
use uuid::Uuid;

// =============================================================================
// ATTRIBUTION
// =============================================================================

/// Attribution for usage tracking and debugging.
///
/// Every request through the gateway carries attribution so we know:
/// - Which dispatch it belongs to (request_id)
/// - Which code path triggered it (caller)
#[derive(Debug, Clone)]
pub struct Attribution {
    /// Per-dispatch correlation id.
    pub request_id: Uuid,
    /// Which code path made this call. Use the task name or a static
    /// string like "dispatcher::ask".
    pub caller: &'static str,
}

impl Attribution {
    pub fn new(caller: &'static str) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            caller,
        }
    }

    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = request_id;
        self
    }
}

// =============================================================================
// GENERATION TYPES
// =============================================================================

/// Request for a single text generation.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// Full prompt text.
    pub prompt: String,
    /// Ask the backend to format its reply as JSON. A hint only; callers
    /// still normalize the reply.
    pub json_mode: bool,
    /// Sampling temperature. `None` leaves the backend default.
    pub temperature: Option<f32>,
    /// Attribution for usage tracking.
    pub attribution: Attribution,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>, attribution: Attribution) -> Self {
        Self {
            prompt: prompt.into(),
            json_mode: false,
            temperature: None,
            attribution,
        }
    }

    pub fn json(mut self) -> Self {
        self.json_mode = true;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.temperature = Some(t);
        self
    }
}

/// Reason the backend stopped generating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DoneReason {
    Stop,
    Length,
    Unknown(String),
}

impl From<Option<String>> for DoneReason {
    fn from(s: Option<String>) -> Self {
        match s.as_deref() {
            Some("stop") => DoneReason::Stop,
            Some("length") => DoneReason::Length,
            Some(other) => DoneReason::Unknown(other.to_string()),
            None => DoneReason::Unknown("none".to_string()),
        }
    }
}

/// Response from a generation call.
#[derive(Debug, Clone)]
pub struct GenerateResponse {
    /// Generated text, verbatim. May be empty.
    pub text: String,
    /// Prompt tokens evaluated, if reported.
    pub prompt_tokens: u32,
    /// Output tokens generated, if reported.
    pub output_tokens: u32,
    /// Time taken for the request.
    pub latency: Duration,
    /// Why the backend stopped.
    pub done_reason: DoneReason,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_builder_sets_hints() {
        let req = GenerateRequest::new("hi", Attribution::new("test"))
            .json()
            .temperature(0.4);
        assert!(req.json_mode);
        assert_eq!(req.temperature, Some(0.4));
        assert_eq!(req.attribution.caller, "test");
    }

    #[test]
    fn done_reason_parsing() {
        assert_eq!(DoneReason::from(Some("stop".into())), DoneReason::Stop);
        assert_eq!(DoneReason::from(Some("length".into())), DoneReason::Length);
        assert_eq!(
            DoneReason::from(None),
            DoneReason::Unknown("none".to_string())
        );
    }

    #[test]
    fn attribution_request_id_override() {
        let id = Uuid::new_v4();
        let attr = Attribution::new("x").with_request_id(id);
        assert_eq!(attr.request_id, id);
    }
}
