//! In-memory auth state shared by the login and logout handlers.

use super::{lockout::LockoutTracker, session::SessionStore};

#[derive(Debug, Default)]
pub struct AuthState {
    lockouts: LockoutTracker,
    sessions: SessionStore,
}

impl AuthState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn lockouts(&self) -> &LockoutTracker {
        &self.lockouts
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }
}
