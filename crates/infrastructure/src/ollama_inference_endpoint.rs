use std::error::Error as StdError;
use std::io;
use std::time::Duration;

use async_trait::async_trait;
use grcpilot_application::InferenceEndpoint;
use grcpilot_domain::{InferenceFailure, InferenceOptions, InferenceRequest};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default base URL of a local Ollama server.
pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// Default model identifier.
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.2";

const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize)]
struct GenerateRequestBody<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: InferenceOptions,
}

#[derive(Debug, Deserialize)]
struct GenerateResponseBody {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
}

#[derive(Debug, Deserialize)]
struct TagsResponseBody {
    #[serde(default)]
    models: Vec<TagsModel>,
}

#[derive(Debug, Deserialize)]
struct TagsModel {
    name: String,
}

/// HTTP adapter for the Ollama generate API.
///
/// The request timeout is whatever the supplied `reqwest::Client` was built
/// with; the adapter makes exactly one attempt per call.
pub struct OllamaInferenceEndpoint {
    http_client: reqwest::Client,
    base_url: String,
    options: InferenceOptions,
    health_timeout: Duration,
}

impl OllamaInferenceEndpoint {
    /// Creates an endpoint adapter for `base_url`.
    #[must_use]
    pub fn new(
        http_client: reqwest::Client,
        base_url: impl Into<String>,
        options: InferenceOptions,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            options,
            health_timeout: DEFAULT_HEALTH_TIMEOUT,
        }
    }

    /// Overrides the timeout used by model listing.
    #[must_use]
    pub fn with_health_timeout(mut self, health_timeout: Duration) -> Self {
        self.health_timeout = health_timeout;
        self
    }

    /// Returns the normalized base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    fn classify_transport_error(&self, error: &reqwest::Error) -> InferenceFailure {
        if error.is_connect() && is_connection_refused(error) {
            return InferenceFailure::EndpointUnavailable {
                endpoint: self.base_url.clone(),
            };
        }

        if error.is_connect() {
            return InferenceFailure::Transport(format!(
                "could not connect to inference endpoint {}: {error}",
                self.base_url
            ));
        }

        if error.is_timeout() {
            return InferenceFailure::Transport(format!("inference request timed out: {error}"));
        }

        InferenceFailure::Transport(format!("inference request failed: {error}"))
    }

    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, InferenceFailure> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<body unavailable>".to_owned());
        Err(InferenceFailure::Transport(format!(
            "inference endpoint returned status {}: {body}",
            status.as_u16()
        )))
    }
}

fn is_connection_refused(error: &reqwest::Error) -> bool {
    let mut source: Option<&(dyn StdError + 'static)> = error.source();
    while let Some(cause) = source {
        if cause
            .downcast_ref::<io::Error>()
            .is_some_and(|io_error| io_error.kind() == io::ErrorKind::ConnectionRefused)
        {
            return true;
        }
        source = cause.source();
    }

    false
}

#[async_trait]
impl InferenceEndpoint for OllamaInferenceEndpoint {
    async fn generate(&self, request: &InferenceRequest) -> Result<String, InferenceFailure> {
        let endpoint = format!("{}/api/generate", self.base_url);
        let prompt = request.wire_prompt();
        let response = self
            .http_client
            .post(endpoint)
            .json(&GenerateRequestBody {
                model: request.model_id.as_str(),
                prompt: prompt.as_str(),
                stream: false,
                options: self.options,
            })
            .send()
            .await
            .map_err(|error| self.classify_transport_error(&error))?;

        let body = Self::ensure_success(response)
            .await?
            .json::<GenerateResponseBody>()
            .await
            .map_err(|error| {
                InferenceFailure::Transport(format!(
                    "failed to parse inference response body: {error}"
                ))
            })?;

        debug!(
            model_id = %request.model_id,
            done = body.done,
            "inference endpoint answered"
        );

        Ok(body.response)
    }

    async fn list_models(&self) -> Result<Vec<String>, InferenceFailure> {
        let endpoint = format!("{}/api/tags", self.base_url);
        let response = self
            .http_client
            .get(endpoint)
            .timeout(self.health_timeout)
            .send()
            .await
            .map_err(|error| self.classify_transport_error(&error))?;

        let body = Self::ensure_success(response)
            .await?
            .json::<TagsResponseBody>()
            .await
            .map_err(|error| {
                InferenceFailure::Transport(format!("failed to parse model list body: {error}"))
            })?;

        Ok(body.models.into_iter().map(|model| model.name).collect())
    }
}
