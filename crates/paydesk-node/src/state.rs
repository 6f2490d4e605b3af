//! Application state.

use std::collections::HashMap;
use std::sync::Arc;

use paydesk_core::{ChatId, Requester};
use paydesk_gateway::PaymentGateway;
use paydesk_intake::OrderSession;
use paydesk_tracker::{InMemoryLedger, TrackerHandle};
use tokio::sync::{Mutex, RwLock};

/// One conversation's session. Events for a chat are applied one at a time.
pub type SharedSession = Arc<Mutex<OrderSession>>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Open conversations.
    pub sessions: Arc<RwLock<HashMap<ChatId, SharedSession>>>,

    pub gateway: Arc<dyn PaymentGateway>,

    /// Queue into the payment tracker.
    pub tracker: TrackerHandle,

    /// Set when sales are kept in process memory.
    pub memory_ledger: Option<InMemoryLedger>,
}

impl AppState {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        tracker: TrackerHandle,
        memory_ledger: Option<InMemoryLedger>,
    ) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            gateway,
            tracker,
            memory_ledger,
        }
    }

    /// Session for `chat_id`, if the chat has one.
    pub async fn session(&self, chat_id: ChatId) -> Option<SharedSession> {
        self.sessions.read().await.get(&chat_id).cloned()
    }

    /// Session for `chat_id`, created for `requester` when missing.
    ///
    /// A requester passed for an existing session replaces the stored one.
    pub async fn session_or_create(
        &self,
        chat_id: ChatId,
        requester: Option<Requester>,
    ) -> SharedSession {
        if let Some(session) = self.session(chat_id).await {
            if let Some(requester) = requester {
                session.lock().await.set_requester(requester);
            }
            return session;
        }

        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(chat_id).or_insert_with(|| {
            let requester = requester.unwrap_or_else(|| Requester::new(chat_id.0, None));
            Arc::new(Mutex::new(OrderSession::new(chat_id, requester)))
        });
        session.clone()
    }

    /// Forget a conversation. The next event starts a fresh session.
    pub async fn remove_session(&self, chat_id: ChatId) {
        self.sessions.write().await.remove(&chat_id);
    }

    /// Conversations with an order in progress. A session that is busy
    /// handling an event counts as open.
    pub async fn open_sessions(&self) -> usize {
        self.sessions
            .read()
            .await
            .values()
            .filter(|session| session.try_lock().map(|s| !s.is_idle()).unwrap_or(true))
            .count()
    }
}
