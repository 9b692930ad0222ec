use clap::Parser;
use std::path::PathBuf;

/// Command-line configuration for a Producer worker pool.
///
/// Mirrors the original prototype's `ConnectionPool(server_host,
/// server_port, pool_size)` constructor arguments, plus the API key the
/// prototype hard-coded as `self.api_key = "API_KEY"`.
#[derive(Debug, Parser)]
#[command(name = "producer", about = "Reverse-connecting SOCKS5 exit worker")]
pub struct Cli {
    /// Geo-Relay host to dial.
    #[arg(long, env = "RELAY_HOST")]
    pub relay_host: String,

    /// Geo-Relay producer-intake port.
    #[arg(long, env = "RELAY_PORT", default_value_t = 30000)]
    pub relay_port: u16,

    /// API key presented during the relay handshake.
    #[arg(long, env = "PRODUCER_API_KEY")]
    pub api_key: String,

    /// Number of concurrent reconnecting workers to run.
    #[arg(long, env = "POOL_SIZE", default_value_t = 1)]
    pub pool_size: usize,

    /// Backoff between reconnect attempts, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    pub reconnect_backoff_ms: u64,

    /// Optional log file path; stderr is used when unset.
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}
