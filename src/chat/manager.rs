// src/chat/manager.rs - In-memory session collection and active pointer
//
// The manager's working copy is the single source of truth while the
// process runs, and the only thing that writes back to the store. Every
// mutation persists immediately; the autosave task covers anything missed.

use super::session::{Session, SessionSummary};
use super::store::{SaveReport, SessionStore};
use crate::provider::Message;

pub struct SessionManager {
    sessions: Vec<Session>,
    active_id: Option<String>,
    store: SessionStore,
}

impl SessionManager {
    /// Load stored sessions and make sure at least one exists.
    pub fn open(store: SessionStore) -> Self {
        let sessions = store.load();
        let mut manager = Self {
            sessions,
            active_id: None,
            store,
        };

        match manager.sessions.first().map(|s| s.id.clone()) {
            Some(front) => {
                manager.active_id = Some(front);
            }
            None => {
                manager.create_session();
            }
        }
        manager
    }

    /// New empty session at the front of the list; it becomes active.
    pub fn create_session(&mut self) -> &Session {
        let session = Session::new();
        tracing::debug!("Created chat {}", session.id);
        self.active_id = Some(session.id.clone());
        self.sessions.insert(0, session);
        self.persist();
        // Eviction only ever drops from the tail, so the new session is still first.
        &self.sessions[0]
    }

    /// Make `id` the active session. Unknown ids change nothing.
    pub fn select_session(&mut self, id: &str) -> Option<&Session> {
        let idx = self.position(id)?;
        self.active_id = Some(id.to_string());
        Some(&self.sessions[idx])
    }

    /// Remove `id`. An empty list gets a fresh session; losing the active
    /// session moves the selection to the front.
    pub fn delete_session(&mut self, id: &str) {
        let Some(idx) = self.position(id) else {
            return;
        };
        self.sessions.remove(idx);
        tracing::debug!("Deleted chat {}", id);
        self.persist();

        if self.sessions.is_empty() {
            self.create_session();
        } else if self.active_id.as_deref() == Some(id) {
            self.active_id = self.sessions.first().map(|s| s.id.clone());
        }
    }

    /// Drop every session and start over with one empty session.
    pub fn clear_all(&mut self) {
        self.sessions.clear();
        self.active_id = None;
        if let Err(e) = self.store.clear() {
            tracing::warn!("Error clearing stored chats: {}", e);
        }
        self.create_session();
    }

    /// Append to a specific session, which need not be the active one.
    /// Returns false if the session is gone.
    pub fn append_message(&mut self, session_id: &str, message: Message) -> bool {
        let Some(idx) = self.position(session_id) else {
            return false;
        };
        self.sessions[idx].push(message);
        self.persist();
        true
    }

    pub fn list_sessions(&self) -> Vec<SessionSummary> {
        self.sessions
            .iter()
            .map(|s| SessionSummary {
                id: s.id.clone(),
                title: s.title.clone(),
                active: self.active_id.as_deref() == Some(s.id.as_str()),
                message_count: s.messages.len(),
            })
            .collect()
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn session(&self, id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    pub fn active_session(&self) -> Option<&Session> {
        self.active_id.as_deref().and_then(|id| self.session(id))
    }

    /// Save the working copy. Failures are logged, never returned.
    pub fn persist(&mut self) -> Option<SaveReport> {
        let result = self.store.save(&mut self.sessions);

        // Eviction may have taken the active session with it.
        let active_gone = self
            .active_id
            .as_deref()
            .is_some_and(|id| self.position(id).is_none());
        if active_gone {
            self.active_id = self.sessions.first().map(|s| s.id.clone());
        }

        match result {
            Ok(report) => Some(report),
            Err(e) => {
                tracing::warn!("Error saving chats: {}", e);
                None
            }
        }
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.sessions.iter().position(|s| s.id == id)
    }
}
