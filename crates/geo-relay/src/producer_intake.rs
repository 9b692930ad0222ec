use crate::pool::ProducerPool;
use byteorder::{BigEndian, ByteOrder};
use socks5_net::AuthService;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{info, warn};

const MAX_API_KEY_LEN: usize = 128;

/// Handles one Producer control connection per §4.3: length-prefixed
/// API key, accept/reject reply, then idle-watch until claimed or
/// disconnected.
pub async fn handle(mut stream: TcpStream, pool: Arc<ProducerPool>, auth: Arc<dyn AuthService>) {
    let peer = match stream.peer_addr() {
        Ok(addr) => addr,
        Err(err) => {
            warn!(%err, "producer connection has no peer address");
            return;
        }
    };

    let api_key = match read_api_key(&mut stream).await {
        Ok(key) => key,
        Err(err) => {
            warn!(%peer, %err, "malformed producer handshake");
            return;
        }
    };

    let accepted = auth.login_producer(&api_key).await;
    let status = if accepted { 1u8 } else { 0u8 };
    if let Err(err) = stream.write_all(&[status]).await {
        warn!(%peer, %err, "failed to write producer handshake status");
        return;
    }

    if !accepted {
        info!(%peer, "producer API key rejected");
        return;
    }

    let (id, claim_rx) = pool.insert().await;
    let pool_size = pool.len().await;
    info!(%peer, pool_size, "producer pooled");

    let mut probe = [0u8; 1];
    tokio::select! {
        res = stream.read(&mut probe) => {
            pool.remove(id).await;
            match res {
                Ok(0) => info!(%peer, "producer disconnected while pooled"),
                Ok(_) => warn!(%peer, "producer sent unexpected data while pooled"),
                Err(err) => warn!(%peer, %err, "producer connection errored while pooled"),
            }
        }
        claim = claim_rx => {
            match claim {
                Ok(responder) => {
                    info!(%peer, "producer claimed by a client session");
                    let _ = responder.send(stream);
                }
                Err(_) => {
                    // Pool dropped the handle without claiming; nothing to hand back.
                }
            }
        }
    }
}

async fn read_api_key(stream: &mut TcpStream) -> std::io::Result<String> {
    let mut len_buf = [0u8; 4];
    stream.read_exact(&mut len_buf).await?;
    let len = BigEndian::read_u32(&len_buf) as usize;

    if len > MAX_API_KEY_LEN {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "producer API key exceeds 128 bytes",
        ));
    }

    let mut key_buf = vec![0u8; len];
    stream.read_exact(&mut key_buf).await?;
    String::from_utf8(key_buf)
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::InvalidData, "non-UTF8 API key"))
}
