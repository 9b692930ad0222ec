mod cli;
mod relay_selector;
mod session;
mod sessions;

use clap::Parser;
use cli::Cli;
use relay_selector::{FixedRelaySelector, RelaySelector};
use sessions::ActiveSessions;
use socks5_net::{AuthService, StaticAuthService};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    socks5_net::logging::init(cli.log_file.as_deref());

    let mut auth = StaticAuthService::new();
    for entry in &cli.end_user_credentials {
        match entry.split_once(':') {
            Some((user, pass)) => auth = auth.with_client(user, pass),
            None => warn!(%entry, "ignoring malformed --end-user-credentials entry (expected user:pass)"),
        }
    }
    let auth: Arc<dyn AuthService> = Arc::new(auth);
    let selector: Arc<dyn RelaySelector> = Arc::new(FixedRelaySelector::default());
    let sessions = Arc::new(ActiveSessions::new());

    let listener = TcpListener::bind(&cli.bind).await?;
    info!(bind = %cli.bind, relay_port = cli.relay_port, "client-gateway listening");

    loop {
        match listener.accept().await {
            Ok((stream, _addr)) => {
                let auth = auth.clone();
                let selector = selector.clone();
                let sessions = sessions.clone();
                tokio::spawn(session::handle(stream, cli.relay_port, auth, selector, sessions));
            }
            Err(err) => error!(%err, "accept failed"),
        }
    }
}
