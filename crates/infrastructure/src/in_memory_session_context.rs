use std::sync::RwLock;

use grcpilot_application::CurrentUserProvider;
use grcpilot_core::UserIdentity;
use tracing::warn;

/// Process-local session holding the signed-in user.
#[derive(Debug, Default)]
pub struct InMemorySessionContext {
    user: RwLock<Option<UserIdentity>>,
}

impl InMemorySessionContext {
    /// Creates a session with no signed-in user.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a session already signed in as `user`.
    #[must_use]
    pub fn signed_in(user: UserIdentity) -> Self {
        Self {
            user: RwLock::new(Some(user)),
        }
    }

    /// Replaces the signed-in user.
    pub fn sign_in(&self, user: UserIdentity) {
        match self.user.write() {
            Ok(mut slot) => *slot = Some(user),
            Err(poisoned) => {
                warn!("session lock was poisoned; recovering");
                *poisoned.into_inner() = Some(user);
            }
        }
    }

    /// Clears the signed-in user.
    pub fn sign_out(&self) {
        match self.user.write() {
            Ok(mut slot) => *slot = None,
            Err(poisoned) => {
                warn!("session lock was poisoned; recovering");
                *poisoned.into_inner() = None;
            }
        }
    }
}

impl CurrentUserProvider for InMemorySessionContext {
    fn current_user(&self) -> Option<UserIdentity> {
        match self.user.read() {
            Ok(slot) => slot.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}
