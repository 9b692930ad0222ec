use clap::Parser;
use std::path::PathBuf;

/// Command-line configuration for a Client-Gateway instance.
#[derive(Debug, Parser)]
#[command(name = "client-gateway", about = "Public SOCKS5 front door for the Geo-Relay network")]
pub struct Cli {
    /// Address to listen on for end-user connections (§6 default 10000).
    #[arg(long, env = "BIND", default_value = "0.0.0.0:10000")]
    pub bind: String,

    /// Port on the selected Geo-Relay to dial as a SOCKS5 client. Fixed
    /// at the client-facing port per the §9 Open Question resolution.
    #[arg(long, env = "RELAY_PORT", default_value_t = 60000)]
    pub relay_port: u16,

    /// End-user credentials accepted by this gateway's `AuthService`.
    #[arg(long, value_delimiter = ',', env = "END_USER_CREDENTIALS")]
    pub end_user_credentials: Vec<String>,

    /// Optional log file path; stderr is used when unset.
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}
