//! Task error taxonomy and its mapping to caller-facing status classes.

use serde::Serialize;
use thiserror::Error;

use crate::gateway::error::{truncate_chars, TransportError};
use crate::normalize::NormalizeError;
use crate::schema::CoerceError;

/// Upper bound on the detail string handed to callers.
pub const MAX_DETAIL_CHARS: usize = 300;

/// Errors surfaced by task dispatch. Every variant is terminal for the request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    /// Caller supplied a blank task name.
    #[error("task name must be non-empty")]
    EmptyTaskName,

    #[error("unknown task: {0}")]
    UnknownTask(String),

    /// No JSON object could be parsed from the model text.
    #[error("malformed model output: {0}")]
    MalformedOutput(String),

    /// JSON parsed, but the required score was absent or non-numeric.
    #[error("validation impossible: {0}")]
    ValidationImpossible(String),

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("upstream timed out")]
    UpstreamTimeout,

    #[error("upstream rejected the request (HTTP {status}): {body}")]
    UpstreamRejected { status: u16, body: String },
}

/// Coarse status class for the boundary layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The request or the model output was unusable.
    Client,
    /// The generation backend failed.
    Unavailable,
}

impl ErrorClass {
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorClass::Client => 400,
            ErrorClass::Unavailable => 503,
        }
    }
}

/// Serializable error payload for callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub detail: String,
    pub status: u16,
}

impl TaskError {
    /// Stable short code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyTaskName => "empty_task_name",
            Self::UnknownTask(_) => "unknown_task",
            Self::MalformedOutput(_) => "malformed_output",
            Self::ValidationImpossible(_) => "validation_impossible",
            Self::UpstreamUnavailable(_) => "upstream_unavailable",
            Self::UpstreamTimeout => "upstream_timeout",
            Self::UpstreamRejected { .. } => "upstream_rejected",
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            Self::EmptyTaskName
            | Self::UnknownTask(_)
            | Self::MalformedOutput(_)
            | Self::ValidationImpossible(_) => ErrorClass::Client,
            Self::UpstreamUnavailable(_) | Self::UpstreamTimeout | Self::UpstreamRejected { .. } => {
                ErrorClass::Unavailable
            }
        }
    }

    pub fn http_status(&self) -> u16 {
        self.class().http_status()
    }

    /// Human-readable detail, bounded to [`MAX_DETAIL_CHARS`].
    pub fn detail(&self) -> String {
        truncate_chars(&self.to_string(), MAX_DETAIL_CHARS)
    }

    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            error: self.code(),
            detail: self.detail(),
            status: self.http_status(),
        }
    }
}

impl From<TransportError> for TaskError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Unavailable(msg) => Self::UpstreamUnavailable(msg),
            TransportError::Config(msg) => {
                Self::UpstreamUnavailable(format!("configuration error: {msg}"))
            }
            TransportError::Timeout(_) => Self::UpstreamTimeout,
            TransportError::Rejected { status, body } => Self::UpstreamRejected { status, body },
        }
    }
}

impl From<NormalizeError> for TaskError {
    fn from(err: NormalizeError) -> Self {
        Self::MalformedOutput(err.to_string())
    }
}

impl From<CoerceError> for TaskError {
    fn from(err: CoerceError) -> Self {
        Self::ValidationImpossible(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn transport_errors_translate_one_to_one() {
        assert_eq!(
            TaskError::from(TransportError::Timeout(Duration::from_secs(120))),
            TaskError::UpstreamTimeout
        );
        assert_eq!(
            TaskError::from(TransportError::rejected(500, "boom")),
            TaskError::UpstreamRejected {
                status: 500,
                body: "boom".to_string()
            }
        );
        assert!(matches!(
            TaskError::from(TransportError::unavailable("refused")),
            TaskError::UpstreamUnavailable(_)
        ));
    }

    #[test]
    fn status_classes() {
        for err in [
            TaskError::EmptyTaskName,
            TaskError::UnknownTask("x".into()),
            TaskError::MalformedOutput("x".into()),
            TaskError::ValidationImpossible("x".into()),
        ] {
            assert_eq!(err.class(), ErrorClass::Client, "{err:?}");
            assert_eq!(err.http_status(), 400);
        }
        for err in [
            TaskError::UpstreamUnavailable("x".into()),
            TaskError::UpstreamTimeout,
            TaskError::UpstreamRejected {
                status: 502,
                body: String::new(),
            },
        ] {
            assert_eq!(err.class(), ErrorClass::Unavailable, "{err:?}");
            assert_eq!(err.http_status(), 503);
        }
    }

    #[test]
    fn coerce_error_message_is_preserved() {
        let err = TaskError::from(CoerceError::MissingScore("absent".into()));
        assert_eq!(
            err,
            TaskError::ValidationImpossible("missing numeric score (absent)".into())
        );
    }

    #[test]
    fn detail_is_bounded() {
        let err = TaskError::UpstreamUnavailable("z".repeat(5_000));
        assert_eq!(err.detail().chars().count(), MAX_DETAIL_CHARS);

        let body = TaskError::UnknownTask("nope".into()).to_body();
        assert_eq!(body.error, "unknown_task");
        assert_eq!(body.status, 400);
        assert_eq!(body.detail, "unknown task: nope");
    }
}
