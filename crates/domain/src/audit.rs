use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use grcpilot_core::UserIdentity;
use serde::{Deserialize, Serialize};

/// Event payload published after every dispatch and normalize cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiInteraction {
    /// Invoking module label.
    pub module: String,
    /// Invoking action label.
    pub action: String,
    /// Prompt sent to the model.
    pub prompt_text: String,
    /// Normalized response, or the degraded message on failure.
    pub response_text: String,
    /// Model identifier used for the call.
    pub model_id: String,
}

/// Identifier of one audit log entry, `LOG-<epoch millis>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AiAuditLogEntryId(String);

impl AiAuditLogEntryId {
    /// Creates the identifier for an entry issued at `epoch_millis`.
    #[must_use]
    pub fn from_epoch_millis(epoch_millis: i64) -> Self {
        Self(format!("LOG-{epoch_millis}"))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for AiAuditLogEntryId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Immutable record of one AI interaction, stamped with the acting user.
///
/// Fields are only readable: once recorded, an entry cannot change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AiAuditLogEntry {
    id: AiAuditLogEntryId,
    timestamp: DateTime<Utc>,
    user_id: String,
    user_name: String,
    module: String,
    action: String,
    prompt_text: String,
    response_text: String,
    model_id: String,
}

impl AiAuditLogEntry {
    /// Finalizes an interaction into an audit entry.
    #[must_use]
    pub fn record(
        id: AiAuditLogEntryId,
        timestamp: DateTime<Utc>,
        user: &UserIdentity,
        interaction: AiInteraction,
    ) -> Self {
        Self {
            id,
            timestamp,
            user_id: user.user_id().to_owned(),
            user_name: user.display_name().to_owned(),
            module: interaction.module,
            action: interaction.action,
            prompt_text: interaction.prompt_text,
            response_text: interaction.response_text,
            model_id: interaction.model_id,
        }
    }

    /// Returns the entry identifier.
    #[must_use]
    pub fn id(&self) -> &AiAuditLogEntryId {
        &self.id
    }

    /// Returns when the entry was recorded.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Returns the timestamp formatted for display.
    #[must_use]
    pub fn display_timestamp(&self) -> String {
        self.timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
    }

    /// Returns the acting user identifier.
    #[must_use]
    pub fn user_id(&self) -> &str {
        self.user_id.as_str()
    }

    /// Returns the acting user display name.
    #[must_use]
    pub fn user_name(&self) -> &str {
        self.user_name.as_str()
    }

    /// Returns the invoking module label.
    #[must_use]
    pub fn module(&self) -> &str {
        self.module.as_str()
    }

    /// Returns the invoking action label.
    #[must_use]
    pub fn action(&self) -> &str {
        self.action.as_str()
    }

    /// Returns the prompt sent to the model.
    #[must_use]
    pub fn prompt_text(&self) -> &str {
        self.prompt_text.as_str()
    }

    /// Returns the recorded response text.
    #[must_use]
    pub fn response_text(&self) -> &str {
        self.response_text.as_str()
    }

    /// Returns the model identifier.
    #[must_use]
    pub fn model_id(&self) -> &str {
        self.model_id.as_str()
    }

    /// Returns whether the user name, module or action contains `term`,
    /// ignoring case.
    #[must_use]
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        [
            self.user_name.as_str(),
            self.module.as_str(),
            self.action.as_str(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(term.as_str()))
    }
}
