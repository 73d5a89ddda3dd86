// src/chat/controller.rs - Submission state machine and command interface
//
// Idle -> Sending -> Applied | Failed. The user's turn is recorded before the
// network call and is never rolled back. Replies land in the session the
// exchange was launched from, even if the user switched sessions meanwhile.
// If that session stops being stored the turn ends as Dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use super::manager::SessionManager;
use super::session::{Session, SessionSummary};
use crate::infra::errors::ExchangeError;
use crate::provider::{ExchangeClient, Message};

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Blank input, or no active session.
    Ignored,
    /// Another submission is still waiting on the backend.
    Busy,
    Applied {
        session_id: String,
        reply: Message,
    },
    /// The apology message was recorded in place of a reply.
    Failed {
        session_id: String,
        error: ExchangeError,
    },
    /// The launching session is no longer stored (deleted, or evicted to
    /// make room), so nothing was recorded for this turn.
    Dropped { session_id: String },
}

/// Clears the in-flight flag however the submission ends.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct ChatController {
    manager: Arc<Mutex<SessionManager>>,
    client: Arc<dyn ExchangeClient>,
    in_flight: AtomicBool,
}

impl ChatController {
    pub fn new(manager: Arc<Mutex<SessionManager>>, client: Arc<dyn ExchangeClient>) -> Self {
        Self {
            manager,
            client,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn lock(&self) -> MutexGuard<'_, SessionManager> {
        self.manager.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Send `input` as a user turn in the active session.
    pub async fn submit(&self, input: &str) -> SubmitOutcome {
        let text = input.trim();
        if text.is_empty() {
            return SubmitOutcome::Ignored;
        }

        let Some(_guard) = InFlight::acquire(&self.in_flight) else {
            tracing::debug!("Submission rejected: exchange already in flight");
            return SubmitOutcome::Busy;
        };

        let (session_id, history) = {
            let mut manager = self.lock();
            let Some(session_id) = manager.active_id().map(str::to_string) else {
                return SubmitOutcome::Ignored;
            };
            // Saving the new turn can evict the session it was added to.
            let history = manager
                .append_message(&session_id, Message::user(text))
                .then(|| manager.session(&session_id).map(|s| s.messages.clone()))
                .flatten();
            let Some(history) = history else {
                tracing::warn!(
                    session = %session_id,
                    "Chat is no longer stored; message not sent"
                );
                return SubmitOutcome::Dropped { session_id };
            };
            (session_id, history)
        };

        tracing::info!(
            session = %session_id,
            messages = history.len(),
            "Exchanging with backend"
        );

        match self.client.exchange(&history).await {
            Ok(reply) => {
                if !self.record(&session_id, reply.clone()) {
                    return SubmitOutcome::Dropped { session_id };
                }
                SubmitOutcome::Applied { session_id, reply }
            }
            Err(error) => {
                tracing::error!(session = %session_id, "Error: {}", error);
                if !self.record(&session_id, Message::apology()) {
                    return SubmitOutcome::Dropped { session_id };
                }
                SubmitOutcome::Failed { session_id, error }
            }
        }
    }

    /// Append to `session_id` and check it is still stored afterwards.
    fn record(&self, session_id: &str, message: Message) -> bool {
        let mut manager = self.lock();
        let kept = manager.append_message(session_id, message)
            && manager.session(session_id).is_some();
        if !kept {
            tracing::warn!(
                session = %session_id,
                "Chat is no longer stored; reply dropped"
            );
        }
        kept
    }

    pub fn submit_new_session(&self) -> Session {
        self.lock().create_session().clone()
    }

    /// Unknown ids are ignored.
    pub fn submit_session_selection(&self, id: &str) -> Option<Session> {
        self.lock().select_session(id).cloned()
    }

    pub fn submit_session_deletion(&self, id: &str) {
        self.lock().delete_session(id);
    }

    pub fn submit_clear_all(&self) {
        self.lock().clear_all();
    }

    pub fn sessions(&self) -> Vec<SessionSummary> {
        self.lock().list_sessions()
    }

    pub fn active_session(&self) -> Option<Session> {
        self.lock().active_session().cloned()
    }

    /// Save now, e.g. at shutdown.
    pub fn flush(&self) {
        self.lock().persist();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::store::{MemoryBackend, SessionStore};
    use crate::provider::{Role, EXCHANGE_APOLOGY};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::AtomicUsize;

    /// Replies with a fixed raw string and counts calls.
    struct CannedClient {
        raw: Result<String, String>,
        calls: AtomicUsize,
    }

    impl CannedClient {
        fn ok(raw: &str) -> Arc<Self> {
            Arc::new(Self {
                raw: Ok(raw.to_string()),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                raw: Err("HTTP error 500".to_string()),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ExchangeClient for CannedClient {
        async fn exchange(&self, _history: &[Message]) -> Result<Message, ExchangeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.raw {
                Ok(raw) => Ok(Message::from_reply(raw)),
                Err(reason) => Err(ExchangeError::new(reason.clone())),
            }
        }
    }

    fn controller(client: Arc<dyn ExchangeClient>) -> ChatController {
        let manager = SessionManager::open(SessionStore::in_memory());
        ChatController::new(Arc::new(Mutex::new(manager)), client)
    }

    #[tokio::test]
    async fn test_blank_input_ignored() {
        let client = CannedClient::ok("hi");
        let c = controller(client.clone());
        assert_eq!(c.submit("   \n\t").await, SubmitOutcome::Ignored);
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
        assert!(c.active_session().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_applied_appends_user_then_reply() {
        let c = controller(CannedClient::ok("<think>reasoning</think>answer"));
        let outcome = c.submit("  hello there  ").await;
        assert!(matches!(outcome, SubmitOutcome::Applied { .. }));

        let session = c.active_session().unwrap();
        assert_eq!(session.title, "hello there");
        assert_eq!(session.messages.len(), 2);
        assert_eq!(session.messages[0], Message::user("hello there"));
        assert_eq!(session.messages[1].role, Role::Assistant);
        assert_eq!(session.messages[1].content, "answer");
        assert_eq!(session.messages[1].thinking.as_deref(), Some("reasoning"));
        assert!(!c.is_busy());
    }

    #[tokio::test]
    async fn test_failed_keeps_user_turn_and_adds_one_apology() {
        let client = CannedClient::failing();
        let c = controller(client.clone());
        let outcome = c.submit("are you there?").await;

        match outcome {
            SubmitOutcome::Failed { error, .. } => assert_eq!(error.reason, "HTTP error 500"),
            other => panic!("expected failure, got {other:?}"),
        }

        let session = c.active_session().unwrap();
        assert_eq!(session.title, "are you there?");
        assert_eq!(session.messages.len(), 2);
        assert_eq!(session.messages[0].content, "are you there?");
        assert_eq!(session.messages[1], Message::assistant(EXCHANGE_APOLOGY));
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_history_includes_new_turn() {
        struct Echo;
        #[async_trait]
        impl ExchangeClient for Echo {
            async fn exchange(&self, history: &[Message]) -> Result<Message, ExchangeError> {
                Ok(Message::assistant(format!("{} messages", history.len())))
            }
        }

        let c = controller(Arc::new(Echo));
        c.submit("one").await;
        let outcome = c.submit("two").await;
        match outcome {
            SubmitOutcome::Applied { reply, .. } => assert_eq!(reply.content, "3 messages"),
            other => panic!("unexpected {other:?}"),
        }
    }

    /// Records the length of every history it is sent.
    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl ExchangeClient for Recorder {
        async fn exchange(&self, history: &[Message]) -> Result<Message, ExchangeError> {
            self.sent.lock().unwrap().push(history.len());
            Ok(Message::assistant("ok"))
        }
    }

    #[tokio::test]
    async fn test_turn_that_evicts_its_own_session_is_not_sent() {
        let store = SessionStore::new(Box::new(MemoryBackend::with_quota(1_000)));
        let manager = SessionManager::open(store);
        let client = Arc::new(Recorder::default());
        let c = ChatController::new(Arc::new(Mutex::new(manager)), client.clone());

        let oldest = c.active_session().unwrap().id;
        let newest = c.submit_new_session().id;
        c.submit_session_selection(&oldest).unwrap();

        let outcome = c.submit(&"x".repeat(2_000)).await;
        assert_eq!(outcome, SubmitOutcome::Dropped { session_id: oldest.clone() });
        assert!(client.sent.lock().unwrap().is_empty());
        assert!(!c.is_busy());

        let sessions = c.sessions();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, newest);
        assert!(sessions[0].active);
        assert_eq!(sessions[0].message_count, 0);
    }

    #[tokio::test]
    async fn test_selection_and_deletion_commands() {
        let c = controller(CannedClient::ok("ok"));
        let first = c.active_session().unwrap().id;
        let second = c.submit_new_session().id;

        assert!(c.submit_session_selection("missing").is_none());
        assert_eq!(c.active_session().unwrap().id, second);

        assert_eq!(c.submit_session_selection(&first).unwrap().id, first);
        c.submit_session_deletion(&first);
        assert_eq!(c.active_session().unwrap().id, second);

        c.submit_session_deletion(&second);
        let sessions = c.sessions();
        assert_eq!(sessions.len(), 1);
        assert!(sessions[0].active);
        assert_ne!(sessions[0].id, second);
    }
}
