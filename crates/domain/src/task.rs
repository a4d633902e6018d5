use std::str::FromStr;

use grcpilot_core::AppError;
use serde::{Deserialize, Serialize};

/// Instruction appended to prompts whose task expects a JSON answer.
pub const STRUCTURED_RESPONSE_INSTRUCTION: &str = "Please respond with valid JSON only.";

/// Call-site categories that drive response normalization policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Narrative answer rendered as plain text.
    FreeTextInsight,
    /// JSON object carrying a score and its explanation.
    StructuredScore,
    /// JSON object or array of extracted items.
    StructuredList,
    /// JSON array of records mapped from tabular input.
    TabularIngestion,
}

impl TaskKind {
    /// Returns a stable storage value for this task kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FreeTextInsight => "free_text_insight",
            Self::StructuredScore => "structured_score",
            Self::StructuredList => "structured_list",
            Self::TabularIngestion => "tabular_ingestion",
        }
    }

    /// Returns whether responses for this task go through JSON extraction.
    #[must_use]
    pub fn expects_structured(&self) -> bool {
        !matches!(self, Self::FreeTextInsight)
    }
}

impl FromStr for TaskKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "free_text_insight" => Ok(Self::FreeTextInsight),
            "structured_score" => Ok(Self::StructuredScore),
            "structured_list" => Ok(Self::StructuredList),
            "tabular_ingestion" => Ok(Self::TabularIngestion),
            _ => Err(AppError::Validation(format!(
                "unknown task kind value '{value}'"
            ))),
        }
    }
}

/// Sampling options sent with every generation request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InferenceOptions {
    /// Sampling temperature.
    pub temperature: f32,
    /// Nucleus sampling cutoff.
    pub top_p: f32,
}

impl Default for InferenceOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.9,
        }
    }
}

/// One prompt ready to be sent to the inference endpoint.
///
/// Requests are transient: built per call and discarded once the response
/// has been normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceRequest {
    /// Call-site category.
    pub task: TaskKind,
    /// Rendered prompt without the structured-response instruction.
    pub prompt_text: String,
    /// Whether the response goes through JSON extraction.
    pub expect_structured: bool,
    /// Model identifier passed to the endpoint.
    pub model_id: String,
}

impl InferenceRequest {
    /// Creates a request whose structured flag follows the task kind.
    #[must_use]
    pub fn new(task: TaskKind, prompt_text: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            task,
            prompt_text: prompt_text.into(),
            expect_structured: task.expects_structured(),
            model_id: model_id.into(),
        }
    }

    /// Returns the prompt exactly as it goes over the wire.
    #[must_use]
    pub fn wire_prompt(&self) -> String {
        if self.expect_structured {
            format!("{}\n\n{STRUCTURED_RESPONSE_INSTRUCTION}", self.prompt_text)
        } else {
            self.prompt_text.clone()
        }
    }
}
