use std::io;

/// Errors raised while driving either side of the SOCKS5 state machine.
///
/// Every variant maps to a §7 error kind in the network's error design:
/// an unexpected version byte or truncated frame is a protocol
/// violation, `Io` is a transport error. Callers close the offending
/// connection on any `ProtoError`; nothing here is recoverable
/// mid-handshake.
#[derive(Debug, thiserror::Error)]
pub enum ProtoError {
    #[error("unsupported SOCKS version {0:#x}")]
    UnsupportedVersion(u8),
    #[error("client did not offer the username/password method")]
    MethodNotOffered,
    #[error("domain name did not resolve to an IPv4 address")]
    DomainNotResolved,
    #[error("server rejected the authentication handshake")]
    AuthRejected,
    #[error(transparent)]
    Io(#[from] io::Error),
}
