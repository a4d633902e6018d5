use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use grcpilot_core::{AppError, AppResult};
use grcpilot_domain::{AiAuditLogEntry, AiAuditLogEntryId, AiInteraction};
use tracing::debug;

use crate::{AiAuditLogRepository, AuditLogSubscriber, CurrentUserProvider};

/// Session-side audit handler that stamps interactions and appends them.
pub struct AiAuditRecorder {
    repository: Arc<dyn AiAuditLogRepository>,
    session: Arc<dyn CurrentUserProvider>,
    last_issued_millis: AtomicI64,
}

impl AiAuditRecorder {
    /// Creates a recorder writing to `repository` on behalf of `session`.
    #[must_use]
    pub fn new(
        repository: Arc<dyn AiAuditLogRepository>,
        session: Arc<dyn CurrentUserProvider>,
    ) -> Self {
        Self {
            repository,
            session,
            last_issued_millis: AtomicI64::new(i64::MIN),
        }
    }

    /// Stamps one interaction with id, time and user, then appends it.
    pub async fn record(&self, interaction: AiInteraction) -> AppResult<AiAuditLogEntry> {
        let user = self.session.current_user().ok_or_else(|| {
            AppError::Unauthorized("no authenticated user in session".to_owned())
        })?;

        let now = Utc::now();
        let id = AiAuditLogEntryId::from_epoch_millis(self.next_millis(now.timestamp_millis()));
        let entry = AiAuditLogEntry::record(id, now, &user, interaction);
        self.repository.prepend_entry(entry.clone()).await?;

        Ok(entry)
    }

    // Ids must stay unique when two entries land in the same millisecond.
    fn next_millis(&self, now_millis: i64) -> i64 {
        let mut issued = now_millis;
        let _ = self
            .last_issued_millis
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                issued = now_millis.max(last.saturating_add(1));
                Some(issued)
            });
        issued
    }
}

#[async_trait]
impl AuditLogSubscriber for AiAuditRecorder {
    async fn on_interaction(&self, interaction: AiInteraction) {
        if let Err(error) = self.record(interaction).await {
            debug!(error = %error, "ai audit log entry dropped");
        }
    }
}
