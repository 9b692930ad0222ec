use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

/// `ClientPairing` per §4.3/§9: tracks active (client, producer)
/// pairings by a stable session id rather than socket identity, so
/// bookkeeping doesn't depend on `TcpStream` being hashable.
pub struct ClientPairing {
    sessions: Mutex<HashMap<u64, SocketAddr>>,
    next_id: AtomicU64,
}

impl ClientPairing {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Records a new pairing, returning its session id.
    pub async fn insert(&self, producer_addr: SocketAddr) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.sessions.lock().await.insert(id, producer_addr);
        id
    }

    /// Tears down a pairing once its splice loop ends.
    pub async fn remove(&self, id: u64) {
        self.sessions.lock().await.remove(&id);
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

impl Default for ClientPairing {
    fn default() -> Self {
        Self::new()
    }
}
