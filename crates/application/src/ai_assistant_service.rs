//! Feature-facing entry point for AI calls.
//!
//! Every call runs dispatch, normalization and audit publication in that
//! order, and always returns a renderable outcome: transport failures become
//! a degraded message in place of the model output.

#[cfg(test)]
mod tests;

use grcpilot_domain::{
    AiFeature, AiInteraction, IngestionTarget, InferenceResult, ParsedResponse, PromptContext,
    normalize_response,
};
use serde_json::Value;

use crate::{AuditLogBridge, EndpointHealth, PromptDispatcher};

/// Result of one AI feature call.
#[derive(Debug, Clone, PartialEq)]
pub struct AiFeatureOutcome {
    /// Feature that was invoked.
    pub feature: AiFeature,
    /// Normalized result.
    pub result: InferenceResult,
}

impl AiFeatureOutcome {
    /// Returns the text shown in the feature's UI slot.
    ///
    /// Failures render as `"<label> unavailable: <reason>"`.
    #[must_use]
    pub fn display_text(&self) -> String {
        match &self.result {
            InferenceResult::PlainText(text) => text.clone(),
            InferenceResult::Structured(parsed) => render_json(parsed.value()),
            InferenceResult::Failure { raw_text, .. } => format!(
                "{} unavailable: {raw_text}",
                self.feature.descriptor().unavailable_label
            ),
        }
    }

    /// Returns the structured response, if the call produced one.
    #[must_use]
    pub fn structured(&self) -> Option<&ParsedResponse> {
        match &self.result {
            InferenceResult::Structured(parsed) => Some(parsed),
            _ => None,
        }
    }

    fn audit_response_text(&self) -> String {
        match (&self.feature, &self.result) {
            (AiFeature::TabularIngestion, InferenceResult::Structured(parsed)) => {
                let records = parsed.value().as_array().map_or(1, Vec::len);
                format!("Mapped {records} records")
            }
            _ => self.display_text(),
        }
    }
}

/// Application service running AI features end to end.
#[derive(Clone)]
pub struct AiAssistantService {
    dispatcher: PromptDispatcher,
    audit_bridge: AuditLogBridge,
}

impl AiAssistantService {
    /// Creates a service publishing to `audit_bridge`.
    #[must_use]
    pub fn new(dispatcher: PromptDispatcher, audit_bridge: AuditLogBridge) -> Self {
        Self {
            dispatcher,
            audit_bridge,
        }
    }

    /// Runs one feature against caller-supplied context.
    pub async fn run_feature(
        &self,
        feature: AiFeature,
        context: &PromptContext,
    ) -> AiFeatureOutcome {
        let request = self.dispatcher.build_request(feature, context);
        let result = match self.dispatcher.send(&request).await {
            Ok(raw_text) => normalize_response(request.task, raw_text.as_str()),
            Err(failure) => InferenceResult::failure(failure),
        };
        let outcome = AiFeatureOutcome { feature, result };

        let descriptor = feature.descriptor();
        self.audit_bridge.publish(AiInteraction {
            module: descriptor.module.to_owned(),
            action: feature.audit_action(context),
            prompt_text: request.prompt_text,
            response_text: outcome.audit_response_text(),
            model_id: request.model_id,
        });

        outcome
    }

    /// Maps tabular content onto a module schema.
    pub async fn ingest_tabular(&self, target: IngestionTarget, data: &str) -> AiFeatureOutcome {
        self.run_feature(AiFeature::TabularIngestion, &target.ingestion_context(data))
            .await
    }

    /// Checks that the endpoint answers and serves the configured model.
    pub async fn check_endpoint(&self) -> EndpointHealth {
        let model_id = self.dispatcher.model_id().to_owned();
        match self.dispatcher.list_models().await {
            Ok(available_models) => {
                let model_available = available_models
                    .iter()
                    .any(|model| model.contains(model_id.as_str()));
                EndpointHealth {
                    model_id,
                    available_models,
                    model_available,
                    failure: None,
                }
            }
            Err(failure) => EndpointHealth {
                model_id,
                available_models: Vec::new(),
                model_available: false,
                failure: Some(failure),
            },
        }
    }
}

fn render_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
