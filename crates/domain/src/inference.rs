use thiserror::Error;

use crate::ParsedResponse;

/// Transport-level failure of one inference call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InferenceFailure {
    /// The endpoint refused the connection.
    #[error("local AI model is not running at {endpoint}; start the inference service first")]
    EndpointUnavailable {
        /// Base URL that refused the connection.
        endpoint: String,
    },

    /// Any other network, status or body failure.
    #[error("failed to reach local AI model: {0}")]
    Transport(String),
}

/// Normalized outcome of one inference call.
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceResult {
    /// Cleaned free-text answer.
    PlainText(String),
    /// JSON answer, real or manufactured.
    Structured(ParsedResponse),
    /// The call never produced model output.
    Failure {
        /// Failure classification.
        failure: InferenceFailure,
        /// Error text standing in for the model output.
        raw_text: String,
    },
}

impl InferenceResult {
    /// Wraps a transport failure, substituting its message for model output.
    #[must_use]
    pub fn failure(failure: InferenceFailure) -> Self {
        let raw_text = failure.to_string();
        Self::Failure { failure, raw_text }
    }

    /// Returns whether the call failed before producing output.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }
}
