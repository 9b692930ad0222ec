mod cli;
mod handshake;
mod worker;

use clap::Parser;
use cli::Cli;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    socks5_net::logging::init(cli.log_file.as_deref());

    info!(
        pool_size = cli.pool_size,
        relay = %cli.relay_host,
        port = cli.relay_port,
        "starting producer pool"
    );

    let mut workers = Vec::with_capacity(cli.pool_size);
    let cli = std::sync::Arc::new(cli);
    for worker_id in 0..cli.pool_size {
        let cli = cli.clone();
        workers.push(tokio::spawn(async move {
            worker::run_worker(&cli, worker_id).await;
        }));
    }

    for handle in workers {
        handle.await?;
    }

    Ok(())
}
