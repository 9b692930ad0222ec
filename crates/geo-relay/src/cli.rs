use clap::Parser;
use std::path::PathBuf;

/// Command-line configuration for a Geo-Relay instance.
///
/// Port defaults match §6: 30000 for Producer intake, 60000 for
/// Gateway-acting-as-client intake.
#[derive(Debug, Parser)]
#[command(name = "geo-relay", about = "Rendezvous server pairing clients with pooled Producers")]
pub struct Cli {
    /// Address to listen on for Producer control connections.
    #[arg(long, env = "PRODUCER_BIND", default_value = "0.0.0.0:30000")]
    pub producer_bind: String,

    /// Address to listen on for client (Gateway) sessions.
    #[arg(long, env = "CLIENT_BIND", default_value = "0.0.0.0:60000")]
    pub client_bind: String,

    /// Producer API keys accepted by this relay's `AuthService`.
    ///
    /// `AuthService` itself is out of scope (§6); this flag configures
    /// the in-memory `StaticAuthService` stand-in used when no other
    /// backend is wired in.
    #[arg(long, value_delimiter = ',', env = "PRODUCER_API_KEYS")]
    pub producer_api_keys: Vec<String>,

    /// Optional log file path; stderr is used when unset.
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}
