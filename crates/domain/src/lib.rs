//! Domain types and rules for AI response ingestion and auditing.

#![forbid(unsafe_code)]

mod audit;
mod feature;
mod inference;
mod normalization;
mod prompt;
mod task;

pub use audit::{AiAuditLogEntry, AiAuditLogEntryId, AiInteraction};
pub use feature::{AiFeature, AiFeatureDescriptor, IngestionTarget, PLAIN_TEXT_INSTRUCTION};
pub use inference::{InferenceFailure, InferenceResult};
pub use normalization::{
    FALLBACK_SCORE, FallbackShape, PARSE_FAILURE_MESSAGE, ParsedResponse, clean_text,
    normalize_response, safe_json_parse,
};
pub use prompt::{ContextValue, PromptContext, PromptTemplate, TRUNCATION_MARKER};
pub use task::{InferenceOptions, InferenceRequest, STRUCTURED_RESPONSE_INSTRUCTION, TaskKind};
