mod cli;
mod client_intake;
mod pairing;
mod pool;
mod producer_intake;

use clap::Parser;
use cli::Cli;
use pairing::ClientPairing;
use pool::ProducerPool;
use socks5_net::{AuthService, StaticAuthService};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    socks5_net::logging::init(cli.log_file.as_deref());

    let mut auth = StaticAuthService::new();
    for key in &cli.producer_api_keys {
        auth = auth.with_producer_key(key.clone());
    }
    let auth: Arc<dyn AuthService> = Arc::new(auth);

    let pool = Arc::new(ProducerPool::new());
    let pairing = Arc::new(ClientPairing::new());

    let producer_listener = TcpListener::bind(&cli.producer_bind).await?;
    let client_listener = TcpListener::bind(&cli.client_bind).await?;
    info!(
        producer_bind = %cli.producer_bind,
        client_bind = %cli.client_bind,
        "geo-relay listening"
    );

    let producer_task = {
        let pool = pool.clone();
        let auth = auth.clone();
        tokio::spawn(async move {
            loop {
                match producer_listener.accept().await {
                    Ok((stream, _addr)) => {
                        let pool = pool.clone();
                        let auth = auth.clone();
                        tokio::spawn(producer_intake::handle(stream, pool, auth));
                    }
                    Err(err) => error!(%err, "producer accept failed"),
                }
            }
        })
    };

    let client_task = tokio::spawn(async move {
        loop {
            match client_listener.accept().await {
                Ok((stream, _addr)) => {
                    let pool = pool.clone();
                    let pairing = pairing.clone();
                    tokio::spawn(client_intake::handle(stream, pool, pairing));
                }
                Err(err) => error!(%err, "client accept failed"),
            }
        }
    });

    let _ = tokio::join!(producer_task, client_task);
    Ok(())
}
