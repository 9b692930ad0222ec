//! Shared SOCKS5 protocol engine, splice loop, and `AuthService` seam
//! used by the `producer`, `geo-relay`, and `client-gateway` daemons.

pub mod auth;
pub mod logging;
pub mod proto;
pub mod splice;

pub use auth::{AuthService, StaticAuthService};
pub use proto::{
    Address, ClientState, Command, ProtoError, ServerState, Socks5Client, Socks5Server,
};
pub use splice::splice;
