use crate::pairing::ClientPairing;
use crate::pool::ProducerPool;
use socks5_net::splice;
use std::sync::Arc;
use tokio::net::TcpStream;
use tracing::{info, warn};

/// Handles one Gateway connection per §4.3's client intake: pop a
/// Producer, record the pairing, splice. The Relay has no protocol
/// awareness of this connection — the inner SOCKS5 handshake the
/// Gateway performs (§4.4 step 6) is answered by the *Producer*, not
/// the Relay, so the first bytes the Relay forwards are that
/// handshake, untouched, exactly as the end user's later CONNECT frame
/// rides through untouched (§4.4's "nested SOCKS5" design note).
pub async fn handle(mut stream: TcpStream, pool: Arc<ProducerPool>, pairing: Arc<ClientPairing>) {
    let peer = match stream.peer_addr() {
        Ok(addr) => addr,
        Err(err) => {
            warn!(%err, "client connection has no peer address");
            return;
        }
    };

    let Some(mut producer) = pool.claim_random().await else {
        warn!(%peer, "no producer available, closing client");
        return;
    };

    let producer_peer = producer
        .peer_addr()
        .unwrap_or_else(|_| "0.0.0.0:0".parse().unwrap());
    let session_id = pairing.insert(producer_peer).await;
    let active_pairings = pairing.len().await;
    info!(%peer, %producer_peer, session_id, active_pairings, "client paired with producer");

    if let Err(err) = splice(&mut stream, &mut producer).await {
        warn!(%peer, %err, "session ended with I/O error");
    }

    pairing.remove(session_id).await;
    info!(%peer, session_id, "session torn down, producer discarded");
}
