use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

/// `active_sessions` per §5: tracks in-flight end-user↔relay pairings
/// by a stable session id, single mutex.
pub struct ActiveSessions {
    sessions: Mutex<HashMap<u64, SocketAddr>>,
    next_id: AtomicU64,
}

impl ActiveSessions {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    pub async fn insert(&self, end_user_addr: SocketAddr) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.sessions.lock().await.insert(id, end_user_addr);
        id
    }

    pub async fn remove(&self, id: u64) {
        self.sessions.lock().await.remove(&id);
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

impl Default for ActiveSessions {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_and_remove_tracks_session_count() {
        let sessions = ActiveSessions::new();
        let addr: SocketAddr = "127.0.0.1:12345".parse().unwrap();

        let id = sessions.insert(addr).await;
        assert_eq!(sessions.len().await, 1);

        sessions.remove(id).await;
        assert_eq!(sessions.len().await, 0);
    }
}
