use std::sync::Arc;

use grcpilot_domain::{AiFeature, InferenceFailure, InferenceRequest, PromptContext};
use tracing::{debug, warn};

use crate::InferenceEndpoint;

/// Builds feature prompts and sends them to the inference endpoint.
#[derive(Clone)]
pub struct PromptDispatcher {
    endpoint: Arc<dyn InferenceEndpoint>,
    model_id: String,
}

impl PromptDispatcher {
    /// Creates a dispatcher bound to one endpoint and model.
    #[must_use]
    pub fn new(endpoint: Arc<dyn InferenceEndpoint>, model_id: impl Into<String>) -> Self {
        Self {
            endpoint,
            model_id: model_id.into(),
        }
    }

    /// Returns the model identifier used for every request.
    #[must_use]
    pub fn model_id(&self) -> &str {
        self.model_id.as_str()
    }

    /// Renders the feature prompt into a request.
    ///
    /// Context values are not validated; a malformed context yields a
    /// malformed prompt rather than an error.
    #[must_use]
    pub fn build_request(&self, feature: AiFeature, context: &PromptContext) -> InferenceRequest {
        InferenceRequest::new(
            feature.descriptor().task,
            feature.render_prompt(context),
            self.model_id.as_str(),
        )
    }

    /// Sends one request and returns the unprocessed model text.
    pub async fn send(&self, request: &InferenceRequest) -> Result<String, InferenceFailure> {
        debug!(
            model_id = %request.model_id,
            task = request.task.as_str(),
            expect_structured = request.expect_structured,
            prompt_chars = request.prompt_text.len(),
            "dispatching inference request"
        );

        match self.endpoint.generate(request).await {
            Ok(raw_text) => {
                debug!(
                    model_id = %request.model_id,
                    response_chars = raw_text.len(),
                    "inference request completed"
                );
                Ok(raw_text)
            }
            Err(failure) => {
                warn!(
                    model_id = %request.model_id,
                    task = request.task.as_str(),
                    error = %failure,
                    "inference request failed"
                );
                Err(failure)
            }
        }
    }

    /// Lists models installed on the endpoint.
    pub async fn list_models(&self) -> Result<Vec<String>, InferenceFailure> {
        self.endpoint.list_models().await
    }
}
