use std::collections::VecDeque;

use async_trait::async_trait;
use grcpilot_application::{AiAuditLogQuery, AiAuditLogRepository};
use grcpilot_core::AppResult;
use grcpilot_domain::AiAuditLogEntry;
use tokio::sync::RwLock;

/// In-memory append-only AI audit log.
///
/// Entries are held newest-first and live for the lifetime of the process.
#[derive(Default)]
pub struct InMemoryAiAuditLogRepository {
    entries: RwLock<VecDeque<AiAuditLogEntry>>,
}

impl InMemoryAiAuditLogRepository {
    /// Creates an empty audit log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of recorded entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns whether no entry has been recorded yet.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl AiAuditLogRepository for InMemoryAiAuditLogRepository {
    async fn prepend_entry(&self, entry: AiAuditLogEntry) -> AppResult<()> {
        self.entries.write().await.push_front(entry);
        Ok(())
    }

    async fn list_entries(&self, query: AiAuditLogQuery) -> AppResult<Vec<AiAuditLogEntry>> {
        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty());
        let limit = query.limit.unwrap_or(usize::MAX);

        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|entry| search.is_none_or(|term| entry.matches_search(term)))
            .take(limit)
            .cloned()
            .collect())
    }
}
