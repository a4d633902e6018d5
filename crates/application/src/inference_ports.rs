use async_trait::async_trait;
use grcpilot_domain::{InferenceFailure, InferenceRequest};

/// Port for the model inference endpoint.
#[async_trait]
pub trait InferenceEndpoint: Send + Sync {
    /// Sends one generation request and returns the raw model text.
    ///
    /// Implementations perform exactly one bounded attempt: no retries.
    async fn generate(&self, request: &InferenceRequest) -> Result<String, InferenceFailure>;

    /// Lists the model identifiers installed on the endpoint.
    async fn list_models(&self) -> Result<Vec<String>, InferenceFailure>;
}

/// Reachability report for the inference endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointHealth {
    /// Model identifier the service is configured with.
    pub model_id: String,
    /// Models installed on the endpoint, empty when unreachable.
    pub available_models: Vec<String>,
    /// Whether the configured model is installed.
    pub model_available: bool,
    /// Failure that prevented the check, if any.
    pub failure: Option<InferenceFailure>,
}

impl EndpointHealth {
    /// Returns whether the endpoint answered the check.
    #[must_use]
    pub fn is_reachable(&self) -> bool {
        self.failure.is_none()
    }

    /// Returns whether the endpoint is reachable and serves the model.
    #[must_use]
    pub fn is_operational(&self) -> bool {
        self.is_reachable() && self.model_available
    }
}
