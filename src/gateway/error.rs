//! Error types for the generation gateway.

use std::time::Duration;
use thiserror::Error;

/// Maximum characters of an upstream error body kept in a diagnostic.
pub const MAX_ERROR_BODY_CHARS: usize = 200;

/// Errors that can occur when calling the generation backend.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Backend could not be reached, or its reply could not be read.
    #[error("generation backend unavailable: {0}")]
    Unavailable(String),

    /// Request timed out.
    #[error("generation backend timed out after {0:?}")]
    Timeout(Duration),

    /// Non-2xx response. `body` is already truncated.
    #[error("generation backend rejected the request (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    /// Configuration error (bad base URL, client build failure).
    #[error("configuration error: {0}")]
    Config(String),
}

impl TransportError {
    /// Create an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Create a rejected error, truncating the body to [`MAX_ERROR_BODY_CHARS`].
    pub fn rejected(status: u16, body: &str) -> Self {
        Self::Rejected {
            status,
            body: truncate_chars(body.trim(), MAX_ERROR_BODY_CHARS),
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Get a short error code for logging.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "unavailable",
            Self::Timeout(_) => "timeout",
            Self::Rejected { .. } => "rejected",
            Self::Config(_) => "config",
        }
    }
}

/// Keep at most `max` characters of `s`, never splitting a character.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
