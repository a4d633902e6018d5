//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_ai_audit_log_repository;
mod in_memory_session_context;
mod ollama_inference_endpoint;

pub use in_memory_ai_audit_log_repository::InMemoryAiAuditLogRepository;
pub use in_memory_session_context::InMemorySessionContext;
pub use ollama_inference_endpoint::{
    DEFAULT_OLLAMA_BASE_URL, DEFAULT_OLLAMA_MODEL, OllamaInferenceEndpoint,
};
