//! In-memory session registry

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard, PoisonError};

use chrono::{DateTime, Utc};

use contracts::{SessionInformations, SessionRegistry};

/// Sessions tracked by the host, keyed by id
#[derive(Debug, Default)]
pub struct InMemorySessionRegistry {
    sessions: RwLock<BTreeMap<String, SessionInformations>>,
}

impl InMemorySessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a session, replacing any previous one with that id
    pub fn create(
        &self,
        id: impl Into<String>,
        remote_addr: Option<String>,
        user: Option<String>,
    ) -> SessionInformations {
        let now = Utc::now();
        let session = SessionInformations {
            id: id.into(),
            created_at: now,
            last_access: now,
            attribute_count: 0,
            serialized_size: None,
            remote_addr,
            user,
        };
        self.write().insert(session.id.clone(), session.clone());
        session
    }

    /// Record an access with the session's current attribute count
    ///
    /// Returns `false` for unknown sessions.
    pub fn touch(&self, id: &str, at: DateTime<Utc>, attribute_count: usize) -> bool {
        match self.write().get_mut(id) {
            Some(session) => {
                session.last_access = at;
                session.attribute_count = attribute_count;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, SessionInformations>> {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, SessionInformations>> {
        self.sessions.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionRegistry for InMemorySessionRegistry {
    fn all_sessions(&self) -> Vec<SessionInformations> {
        let mut sessions: Vec<_> = self.read().values().cloned().collect();
        sessions.sort_by(|a, b| b.last_access.cmp(&a.last_access).then_with(|| a.id.cmp(&b.id)));
        sessions
    }

    fn session(&self, id: &str) -> Option<SessionInformations> {
        self.read().get(id).cloned()
    }

    fn invalidate_all(&self) -> usize {
        let mut sessions = self.write();
        let count = sessions.len();
        sessions.clear();
        count
    }

    fn invalidate(&self, id: &str) -> bool {
        self.write().remove(id).is_some()
    }
}
