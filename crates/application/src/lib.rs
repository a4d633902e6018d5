//! Application services and ports.

#![forbid(unsafe_code)]

mod ai_assistant_service;
mod ai_audit_ports;
mod ai_audit_recorder;
mod audit_log_bridge;
mod inference_ports;
mod prompt_dispatcher;

pub use ai_assistant_service::{AiAssistantService, AiFeatureOutcome};
pub use ai_audit_ports::{AiAuditLogQuery, AiAuditLogRepository, CurrentUserProvider};
pub use ai_audit_recorder::AiAuditRecorder;
pub use audit_log_bridge::{AuditLogBridge, AuditLogSubscriber, AuditSubscription};
pub use inference_ports::{EndpointHealth, InferenceEndpoint};
pub use prompt_dispatcher::PromptDispatcher;
