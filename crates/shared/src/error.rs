use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The only failure text shown to the user. Transport errors, timeouts and
/// non-2xx statuses all collapse into it; the detailed cause is logged instead.
pub const TRANSPORT_FAILURE_MESSAGE: &str =
    "Failed to connect to the server. Is the classification service running?";

/// User-facing failure description held in controller state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub message: String,
}

impl ErrorInfo {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn connectivity() -> Self {
        Self::new(TRANSPORT_FAILURE_MESSAGE)
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    #[error("confidence {0} is outside [0, 1]")]
    ConfidenceOutOfRange(f64),
}
