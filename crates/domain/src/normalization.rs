//! Response normalization for raw model output.
//!
//! Models wrap JSON in prose and decorate plain text with markdown even when
//! told not to. This module absorbs both habits: free-text answers are
//! cleaned of cosmetic markup, and structured answers are extracted from
//! surrounding prose. A structured answer that still fails to parse degrades
//! to a manufactured value instead of an error, tagged so callers can tell it
//! apart from real model output.

mod clean_text;
mod json_payload;


use serde_json::Value;

use crate::{InferenceResult, TaskKind};

pub use clean_text::clean_text;
pub use json_payload::{FALLBACK_SCORE, FallbackShape, PARSE_FAILURE_MESSAGE, safe_json_parse};

/// JSON answer after extraction, tagged by provenance.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedResponse {
    /// Value parsed from the model output.
    Structured(Value),
    /// Placeholder whose shape was guessed from keywords in the output.
    ///
    /// Numeric fields hold [`FALLBACK_SCORE`] as an "unknown, assume nominal"
    /// sentinel, not a computed score.
    FallbackGuessed {
        /// Guessed shape.
        shape: FallbackShape,
        /// Manufactured value.
        value: Value,
    },
    /// Generic wrapper around output that could not be parsed.
    Unstructured(Value),
}

impl ParsedResponse {
    /// Returns the JSON value regardless of provenance.
    #[must_use]
    pub fn value(&self) -> &Value {
        match self {
            Self::Structured(value)
            | Self::FallbackGuessed { value, .. }
            | Self::Unstructured(value) => value,
        }
    }

    /// Consumes the response and returns its JSON value.
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::Structured(value)
            | Self::FallbackGuessed { value, .. }
            | Self::Unstructured(value) => value,
        }
    }

    /// Returns whether the value came from the model rather than a fallback.
    #[must_use]
    pub fn is_model_output(&self) -> bool {
        matches!(self, Self::Structured(_))
    }

    fn map_value(self, transform: impl FnOnce(Value) -> Value) -> Self {
        match self {
            Self::Structured(value) => Self::Structured(transform(value)),
            Self::FallbackGuessed { shape, value } => Self::FallbackGuessed {
                shape,
                value: transform(value),
            },
            Self::Unstructured(value) => Self::Unstructured(transform(value)),
        }
    }
}

/// Normalizes raw model output according to the task's policy.
///
/// Free-text tasks are cleaned, every other task goes through JSON
/// extraction. Tabular ingestion always yields an array: a lone value is
/// wrapped into a one-element array.
#[must_use]
pub fn normalize_response(task: TaskKind, raw_text: &str) -> InferenceResult {
    if !task.expects_structured() {
        return InferenceResult::PlainText(clean_text(raw_text));
    }

    let parsed = safe_json_parse(raw_text);
    match task {
        TaskKind::TabularIngestion => InferenceResult::Structured(parsed.map_value(into_array)),
        _ => InferenceResult::Structured(parsed),
    }
}

fn into_array(value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items),
        other => Value::Array(vec![other]),
    }
}
