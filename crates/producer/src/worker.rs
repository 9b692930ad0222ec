use crate::cli::Cli;
use crate::handshake::relay_handshake;
use socks5_net::{splice, Socks5Server};
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::{error, info, warn};

/// Outcome of one session attempt, distinguishing the one error kind
/// that should terminate the whole worker process (§4.2 step 2: "on
/// rejection log and exit the process — a bad key is never
/// recoverable") from every other failure, which just triggers a
/// reconnect per the infinite-loop semantics in §7.
pub enum SessionOutcome {
    Completed,
    Retryable,
    FatalApiKeyRejected,
}

/// Runs the infinite reconnect loop of §4.2 for a single worker.
pub async fn run_worker(cfg: &Cli, worker_id: usize) {
    loop {
        match run_session(cfg, worker_id).await {
            SessionOutcome::Completed | SessionOutcome::Retryable => {
                tokio::time::sleep(Duration::from_millis(cfg.reconnect_backoff_ms)).await;
            }
            SessionOutcome::FatalApiKeyRejected => {
                error!(worker_id, "API key rejected by relay, exiting");
                std::process::exit(1);
            }
        }
    }
}

async fn run_session(cfg: &Cli, worker_id: usize) -> SessionOutcome {
    info!(worker_id, relay = %cfg.relay_host, port = cfg.relay_port, "connecting to relay");

    let mut stream = match TcpStream::connect((cfg.relay_host.as_str(), cfg.relay_port)).await {
        Ok(s) => s,
        Err(err) => {
            warn!(worker_id, %err, "failed to connect to relay");
            return SessionOutcome::Retryable;
        }
    };

    match relay_handshake(&mut stream, &cfg.api_key).await {
        Ok(true) => {}
        Ok(false) => return SessionOutcome::FatalApiKeyRejected,
        Err(err) => {
            warn!(worker_id, %err, "relay handshake I/O error");
            return SessionOutcome::Retryable;
        }
    }

    let mut server = Socks5Server::new(stream);

    // The inner handshake's credentials are not checked against
    // AuthService here — §9 notes this pair is symbolic, and the
    // Producer accepts whatever the Geo-Relay's client-role handshake
    // presents.
    match server.auth_handshake().await {
        Ok((true, _, _)) => {}
        Ok((false, _, _)) => {
            warn!(worker_id, "relay sent an invalid SOCKS5 greeting");
            return SessionOutcome::Retryable;
        }
        Err(err) => {
            warn!(worker_id, %err, "SOCKS5 auth handshake failed");
            return SessionOutcome::Retryable;
        }
    }

    if let Err(err) = server.complete_auth_handshake().await {
        warn!(worker_id, %err, "failed to complete auth handshake");
        return SessionOutcome::Retryable;
    }

    let (address, port) = match server.get_request().await {
        Ok(Some((_cmd, address, port))) => (address, port),
        Ok(None) => {
            warn!(worker_id, "unsupported or malformed SOCKS5 request");
            return SessionOutcome::Retryable;
        }
        Err(err) => {
            warn!(worker_id, %err, "failed to read SOCKS5 request");
            return SessionOutcome::Retryable;
        }
    };

    let mut upstream = match server.send_reply(&address, port).await {
        Ok(upstream) => upstream,
        Err(err) => {
            warn!(worker_id, %err, "failed to open upstream connection");
            return SessionOutcome::Retryable;
        }
    };

    info!(worker_id, "serving SOCKS5 session");
    server.mark_splicing();
    let mut relay_stream = server.into_inner();
    if let Err(err) = splice(&mut relay_stream, &mut upstream).await {
        warn!(worker_id, %err, "session ended with I/O error");
    }

    info!(worker_id, "session complete, reconnecting");
    SessionOutcome::Completed
}
