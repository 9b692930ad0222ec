use crate::relay_selector::RelaySelector;
use crate::sessions::ActiveSessions;
use socks5_net::{splice, AuthService, Socks5Client, Socks5Server};
use std::sync::Arc;
use tokio::net::TcpStream;
use tracing::{info, warn};

const RELAY_USERNAME: &str = "gateway";
const RELAY_PASSWORD: &str = "gateway";

/// Handles one end-user connection per §4.4 steps 1–8.
pub async fn handle(
    stream: TcpStream,
    relay_port: u16,
    auth: Arc<dyn AuthService>,
    selector: Arc<dyn RelaySelector>,
    sessions: Arc<ActiveSessions>,
) {
    let peer = match stream.peer_addr() {
        Ok(addr) => addr,
        Err(err) => {
            warn!(%err, "end-user connection has no peer address");
            return;
        }
    };

    let mut server = Socks5Server::new(stream);
    let (username, password) = match server.auth_handshake().await {
        Ok((true, Some(username), Some(password))) => (username, password),
        Ok(_) => {
            warn!(%peer, "end user sent an invalid SOCKS5 greeting");
            return;
        }
        Err(err) => {
            warn!(%peer, %err, "SOCKS5 auth handshake failed");
            return;
        }
    };

    if !auth.login_client(&username, &password).await {
        warn!(%peer, %username, "end-user credentials rejected");
        return;
    }

    if let Err(err) = server.complete_auth_handshake().await {
        warn!(%peer, %err, "failed to complete auth handshake");
        return;
    }

    let relay_host = selector.select_relay();
    info!(%peer, %username, relay = %relay_host, "end user authenticated");

    let relay_stream = match TcpStream::connect((relay_host.as_str(), relay_port)).await {
        Ok(stream) => stream,
        Err(err) => {
            warn!(%peer, %err, relay = %relay_host, "failed to dial geo-relay");
            return;
        }
    };

    let mut relay_client = Socks5Client::new(relay_stream);
    if let Err(err) = negotiate_relay(&mut relay_client).await {
        warn!(%peer, %err, "relay handshake failed");
        return;
    }

    let session_id = sessions.insert(peer).await;
    let active_sessions = sessions.len().await;
    info!(%peer, session_id, active_sessions, "session established, splicing");

    server.mark_splicing();
    let mut end_user_stream = server.into_inner();
    let mut relay_stream = relay_client.into_inner();
    if let Err(err) = splice(&mut end_user_stream, &mut relay_stream).await {
        warn!(%peer, %err, "session ended with I/O error");
    }

    sessions.remove(session_id).await;
    info!(%peer, session_id, "session torn down");
}

async fn negotiate_relay(client: &mut Socks5Client<TcpStream>) -> Result<(), socks5_net::ProtoError> {
    client.send_version_nmethods_methods().await?;
    client.get_version_method_response().await?;
    client.send_auth(RELAY_USERNAME, RELAY_PASSWORD).await?;
    client.get_auth_response().await
}
