//! The SOCKS5 protocol engine (RFC 1928 base + RFC 1929 username/password
//! sub-negotiation), restricted to the subset this network actually uses:
//! method 0x02 only, CMD=CONNECT only, request ATYP IPv4/domain, reply
//! ATYP always IPv4.

mod address;
mod client;
mod error;
mod server;

pub use address::{Address, Command};
pub use client::{ClientState, Socks5Client};
pub use error::ProtoError;
pub use server::{ServerState, Socks5Server};
