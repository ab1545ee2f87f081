use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::{SessionHandle, SessionId, SessionState, SessionStore};

struct StoredSession {
    handle: SessionHandle,
    last_seen: Instant,
}

/// Process-local session store with sliding idle expiry.
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<SessionId, StoredSession>>,
    ttl: Duration,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        info!("SessionStore initialized (idle ttl {}s)", ttl.as_secs());
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
        }
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, id: &SessionId) -> Option<SessionHandle> {
        let mut sessions = self.sessions.lock().await;
        let now = Instant::now();

        let expired = sessions
            .get(id)
            .is_some_and(|s| now.duration_since(s.last_seen) > self.ttl);
        if expired {
            sessions.remove(id);
            debug!("Session expired: {id}");
            return None;
        }

        sessions.get_mut(id).map(|s| {
            s.last_seen = now;
            Arc::clone(&s.handle)
        })
    }

    async fn put(&self, state: SessionState) -> SessionHandle {
        let id = state.id.clone();
        let handle = Arc::new(Mutex::new(state));
        self.sessions.lock().await.insert(
            id.clone(),
            StoredSession {
                handle: Arc::clone(&handle),
                last_seen: Instant::now(),
            },
        );
        debug!("Stored session: {id}");
        handle
    }

    async fn delete(&self, id: &SessionId) -> bool {
        let removed = self.sessions.lock().await.remove(id).is_some();
        if removed {
            info!("Cleared session: {id}");
        }
        removed
    }

    async fn purge_expired(&self) -> usize {
        let mut sessions = self.sessions.lock().await;
        let now = Instant::now();
        let before = sessions.len();
        sessions.retain(|_, s| now.duration_since(s.last_seen) <= self.ttl);
        before - sessions.len()
    }

    async fn count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use policyqa_conversation::ConversationContext;
    use policyqa_core::{DocumentMetadata, FileType};

    fn new_state(username: &str) -> SessionState {
        SessionState::new(username, ConversationContext::new())
    }

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = InMemorySessionStore::new(Duration::from_secs(60));
        let state = new_state("abhay");
        let id = state.id.clone();

        store.put(state).await;
        let handle = store.get(&id).await;
        assert!(handle.is_some());
        if let Some(handle) = handle {
            assert_eq!(handle.lock().await.username, "abhay");
        }

        assert!(store.delete(&id).await);
        assert!(store.get(&id).await.is_none());
        assert!(!store.delete(&id).await);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = InMemorySessionStore::new(Duration::from_secs(60));
        let a = store.put(new_state("a")).await;
        let b = store.put(new_state("b")).await;

        let text = "Only for a.";
        a.lock()
            .await
            .context
            .seed(text, DocumentMetadata::derive("a.txt", 11, FileType::Txt, text))
            .unwrap_or_else(|e| panic!("{e}"));

        assert!(a.lock().await.context.has_document());
        assert!(!b.lock().await.context.has_document());
        assert_eq!(store.count().await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_sessions_expire() {
        let store = InMemorySessionStore::new(Duration::from_secs(60));
        let idle = new_state("idle");
        let idle_id = idle.id.clone();
        let active = new_state("active");
        let active_id = active.id.clone();
        store.put(idle).await;
        store.put(active).await;

        tokio::time::advance(Duration::from_secs(40)).await;
        assert!(store.get(&active_id).await.is_some());

        tokio::time::advance(Duration::from_secs(40)).await;
        assert_eq!(store.purge_expired().await, 1);
        assert!(store.get(&idle_id).await.is_none());
        assert!(store.get(&active_id).await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_drops_expired_session() {
        let store = InMemorySessionStore::new(Duration::from_secs(10));
        let state = new_state("late");
        let id = state.id.clone();
        store.put(state).await;

        tokio::time::advance(Duration::from_secs(11)).await;
        assert!(store.get(&id).await.is_none());
        assert_eq!(store.count().await, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_records_are_all_kept() {
        let store = Arc::new(InMemorySessionStore::new(Duration::from_secs(60)));
        let state = new_state("busy");
        let id = state.id.clone();
        store.put(state).await;

        let tasks: Vec<_> = (0..32)
            .map(|i| {
                let store = Arc::clone(&store);
                let id = id.clone();
                tokio::spawn(async move {
                    if let Some(handle) = store.get(&id).await {
                        let mut session = handle.lock().await;
                        session.context.record(format!("q{i}"), format!("a{i}"));
                    }
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap_or_else(|e| panic!("{e}"));
        }

        let handle = store
            .get(&id)
            .await
            .unwrap_or_else(|| panic!("session {id} missing"));
        let session = handle.lock().await;
        assert_eq!(session.context.history().len(), 32);
    }
}
