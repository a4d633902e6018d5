use async_trait::async_trait;
use grcpilot_core::{AppResult, UserIdentity};
use grcpilot_domain::AiAuditLogEntry;

/// Query parameters for audit trail listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AiAuditLogQuery {
    /// Case-insensitive term matched against user name, module and action.
    pub search: Option<String>,
    /// Maximum entries returned.
    pub limit: Option<usize>,
}

/// Port for the append-only AI audit log.
///
/// The contract exposes no update or delete operation.
#[async_trait]
pub trait AiAuditLogRepository: Send + Sync {
    /// Adds an entry at the head of the log.
    async fn prepend_entry(&self, entry: AiAuditLogEntry) -> AppResult<()>;

    /// Lists entries newest-first.
    async fn list_entries(&self, query: AiAuditLogQuery) -> AppResult<Vec<AiAuditLogEntry>>;
}

/// Port exposing the authenticated user of the active session.
pub trait CurrentUserProvider: Send + Sync {
    /// Returns the authenticated user, if any.
    fn current_user(&self) -> Option<UserIdentity>;
}
