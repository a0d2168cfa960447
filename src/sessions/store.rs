use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use teloxide::types::ChatId;
use tokio::sync::Mutex as AsyncMutex;

use super::ChatSession;

/// In-memory session store keyed by chat id.
///
/// Sessions live for the process lifetime only; nothing is persisted.
/// [`guard`](SessionStore::guard) hands out one async mutex per chat so that
/// events for the same chat are processed in order even though handlers run
/// on spawned tasks. Different chats proceed independently.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<ChatId, ChatSession>>>,
    guards: Arc<Mutex<HashMap<ChatId, Arc<AsyncMutex<()>>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        SessionStore::default()
    }

    pub fn get(&self, chat_id: ChatId) -> Option<ChatSession> {
        self.sessions.lock().get(&chat_id).cloned()
    }

    pub fn put(&self, chat_id: ChatId, session: ChatSession) {
        self.sessions.lock().insert(chat_id, session);
    }

    #[allow(dead_code)]
    pub fn clear(&self, chat_id: ChatId) {
        self.sessions.lock().remove(&chat_id);
    }

    /// Serialization guard for one chat. Hold it for the whole event,
    /// including the search-and-send sequence.
    pub fn guard(&self, chat_id: ChatId) -> Arc<AsyncMutex<()>> {
        self.guards.lock().entry(chat_id).or_default().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_and_clears_sessions_per_chat() {
        let store = SessionStore::new();
        let chat = ChatId(7);

        assert!(store.get(chat).is_none());

        store.put(chat, ChatSession::started());
        assert!(store.get(chat).is_some());
        assert!(store.get(ChatId(8)).is_none());

        store.clear(chat);
        assert!(store.get(chat).is_none());
    }

    #[test]
    fn hands_out_one_guard_per_chat() {
        let store = SessionStore::new();
        let first = store.guard(ChatId(7));
        let again = store.guard(ChatId(7));
        let other = store.guard(ChatId(8));

        assert!(Arc::ptr_eq(&first, &again));
        assert!(!Arc::ptr_eq(&first, &other));
    }

    #[tokio::test]
    async fn guard_serializes_access_to_a_chat() {
        let store = SessionStore::new();
        let guard = store.guard(ChatId(7));

        let held = guard.lock().await;
        assert!(store.guard(ChatId(7)).try_lock().is_err());
        drop(held);
        assert!(store.guard(ChatId(7)).try_lock().is_ok());
    }
}
