//! Server-side session storage.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use clinic_auth::Principal;

use crate::context::SessionId;

/// Session store abstraction.
pub trait SessionStore: Send + Sync {
    /// Start a session for a freshly authenticated principal.
    fn create(&self, principal: Principal) -> Result<SessionId, SessionStoreError>;

    fn load(&self, id: SessionId) -> Result<Option<Principal>, SessionStoreError>;

    /// Persist an updated principal (e.g. after role-name hydration).
    fn save(&self, id: SessionId, principal: Principal) -> Result<(), SessionStoreError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionStoreError {
    #[error("session not found: {0}")]
    NotFound(SessionId),
    #[error("storage error: {0}")]
    Storage(String),
}

/// In-memory session store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Principal>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

fn poisoned() -> SessionStoreError {
    SessionStoreError::Storage("session store lock poisoned".to_string())
}

impl SessionStore for InMemorySessionStore {
    fn create(&self, principal: Principal) -> Result<SessionId, SessionStoreError> {
        let id = SessionId::new();
        self.sessions.write().map_err(|_| poisoned())?.insert(id, principal);
        Ok(id)
    }

    fn load(&self, id: SessionId) -> Result<Option<Principal>, SessionStoreError> {
        Ok(self.sessions.read().map_err(|_| poisoned())?.get(&id).cloned())
    }

    fn save(&self, id: SessionId, principal: Principal) -> Result<(), SessionStoreError> {
        let mut sessions = self.sessions.write().map_err(|_| poisoned())?;
        match sessions.get_mut(&id) {
            Some(slot) => {
                *slot = principal;
                Ok(())
            }
            None => Err(SessionStoreError::NotFound(id)),
        }
    }
}
