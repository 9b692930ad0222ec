use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::net::TcpStream;
use tokio::sync::{oneshot, Mutex};

/// A response channel: send the claimed socket back to whoever popped it.
pub type ClaimResponder = oneshot::Sender<TcpStream>;

/// Entry held in the pool while a Producer connection is idle.
///
/// The connection itself stays with the intake task that accepted it
/// (see `producer_intake`) for as long as it's unclaimed — the pool
/// only holds a handle that lets a client-intake task signal "you're
/// mine now" and get the socket handed back across the channel. This
/// keeps exactly one task owning the socket at any instant (§5), rather
/// than having the intake task's disconnect-watch read race a splice
/// loop over the same stream.
struct ProducerHandle {
    claim_tx: oneshot::Sender<ClaimResponder>,
}

/// `ProducerPool` per §4.3/§9: swap-and-pop storage for O(1) random
/// removal, single mutex, push on accept and pop-random on client
/// arrival.
pub struct ProducerPool {
    entries: Mutex<HashMap<u64, ProducerHandle>>,
    next_id: AtomicU64,
}

impl ProducerPool {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Registers an idle Producer, returning its pool id and the
    /// oneshot the intake task should race against its disconnect-watch
    /// read.
    pub async fn insert(&self) -> (u64, oneshot::Receiver<ClaimResponder>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (claim_tx, claim_rx) = oneshot::channel();
        self.entries.lock().await.insert(id, ProducerHandle { claim_tx });
        (id, claim_rx)
    }

    /// Removes an entry by id, e.g. when its disconnect-watch read
    /// fires while still pooled. A no-op if it was already claimed.
    pub async fn remove(&self, id: u64) {
        self.entries.lock().await.remove(&id);
    }

    /// Pops a uniformly random idle Producer and claims it, handing
    /// back the live socket. Returns `None` if the pool is empty.
    pub async fn claim_random(&self) -> Option<TcpStream> {
        let handle = {
            let mut guard = self.entries.lock().await;
            if guard.is_empty() {
                return None;
            }
            let idx = rand::random::<usize>() % guard.len();
            let id = *guard.keys().nth(idx).expect("idx < len");
            guard.remove(&id)
        }?;

        let (resp_tx, resp_rx) = oneshot::channel();
        // The intake task may have raced us to EOF between the lock
        // release above and this send; treat a dropped receiver as
        // "no Producer available" rather than panicking.
        handle.claim_tx.send(resp_tx).ok()?;
        resp_rx.await.ok()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

impl Default for ProducerPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    async fn loopback_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (server, _) = listener.accept().await.unwrap();
        (client, server)
    }

    #[tokio::test]
    async fn claim_random_hands_back_the_pooled_stream() {
        let pool = ProducerPool::new();
        let (_producer_side, relay_side) = loopback_pair().await;

        let (id, claim_rx) = pool.insert().await;
        assert_eq!(pool.len().await, 1);

        let watcher = tokio::spawn(async move {
            let mut probe = [0u8; 1];
            let mut stream = relay_side;
            tokio::select! {
                _ = stream.read(&mut probe) => unreachable!("nothing should arrive while pooled"),
                claim = claim_rx => claim.ok().map(|responder| responder.send(stream).is_ok()),
            }
        });

        let claimed = pool.claim_random().await;
        assert!(claimed.is_some());
        assert_eq!(pool.len().await, 0);
        assert_eq!(watcher.await.unwrap(), Some(true));
        let _ = id;
    }

    #[tokio::test]
    async fn empty_pool_claim_returns_none() {
        let pool = ProducerPool::new();
        assert!(pool.claim_random().await.is_none());
    }

    #[tokio::test]
    async fn remove_by_id_drops_exactly_one_entry() {
        let pool = ProducerPool::new();
        let (id_a, claim_rx_a) = pool.insert().await;
        let (_id_b, claim_rx_b) = pool.insert().await;
        assert_eq!(pool.len().await, 2);

        pool.remove(id_a).await;
        assert_eq!(pool.len().await, 1);

        drop(claim_rx_a);
        drop(claim_rx_b);
    }
}
