use super::address::{Address, Command};
use super::error::ProtoError;
use byteorder::{BigEndian, ByteOrder};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

/// The server-role SOCKS5 state machine (§4.1).
///
/// Transitions only move forward; an illegal read (bad version,
/// truncated frame, missing method 0x02) is terminal and the caller is
/// expected to close the underlying connection without advancing state
/// further. Modeled as an explicit tag rather than a handful of
/// booleans so `state()` always answers "what phase is this connection
/// in" unambiguously.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Init,
    MethodSent,
    CredsReceived,
    Authed,
    RequestRead,
    Replied,
    Splicing,
    Closed,
}

/// Server side of a SOCKS5 connection, wrapping any byte stream.
///
/// Drives `auth_handshake` → `complete_auth_handshake` → `get_request`
/// → `send_reply` in that order; each method advances [`ServerState`]
/// and the caller is responsible for validating credentials against its
/// `AuthService` between `auth_handshake` and `complete_auth_handshake`
/// — this type never calls out to an auth backend itself, so it cannot
/// emit `[01, 00]` before the caller has had the chance to check
/// credentials (the invariant from §8).
pub struct Socks5Server<S> {
    stream: S,
    state: ServerState,
}

impl<S> Socks5Server<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            state: ServerState::Init,
        }
    }

    pub fn state(&self) -> ServerState {
        self.state
    }

    pub fn into_inner(self) -> S {
        self.stream
    }

    /// Reads the method-negotiation greeting and, if method 0x02 is
    /// offered, the username/password sub-negotiation frame.
    ///
    /// Returns `(true, username, password)` only once both phases
    /// succeed. A version mismatch, `NMETHODS == 0`, or the absence of
    /// method 0x02 returns `Ok(false, None, None)` without writing the
    /// `[05, 02]` reply, leaving the connection for the caller to
    /// close — matching the boundary behaviours in §8.
    pub async fn auth_handshake(
        &mut self,
    ) -> Result<(bool, Option<String>, Option<String>), ProtoError> {
        let mut header = [0u8; 2];
        self.stream.read_exact(&mut header).await?;
        let (version, nmethods) = (header[0], header[1]);

        if version != 0x05 {
            self.state = ServerState::Closed;
            return Ok((false, None, None));
        }
        if nmethods == 0 {
            self.state = ServerState::Closed;
            return Ok((false, None, None));
        }

        let mut methods = vec![0u8; nmethods as usize];
        self.stream.read_exact(&mut methods).await?;

        if !methods.contains(&0x02) {
            self.state = ServerState::Closed;
            return Ok((false, None, None));
        }

        self.stream.write_all(&[0x05, 0x02]).await?;
        self.state = ServerState::MethodSent;

        let (username, password) = self.read_credentials().await?;
        self.state = ServerState::CredsReceived;

        Ok((true, Some(username), Some(password)))
    }

    async fn read_credentials(&mut self) -> Result<(String, String), ProtoError> {
        let mut version = [0u8];
        self.stream.read_exact(&mut version).await?;
        if version[0] != 0x01 {
            return Err(ProtoError::UnsupportedVersion(version[0]));
        }

        let mut ulen = [0u8];
        self.stream.read_exact(&mut ulen).await?;
        let mut uname = vec![0u8; ulen[0] as usize];
        self.stream.read_exact(&mut uname).await?;

        let mut plen = [0u8];
        self.stream.read_exact(&mut plen).await?;
        let mut passwd = vec![0u8; plen[0] as usize];
        self.stream.read_exact(&mut passwd).await?;

        let username = String::from_utf8_lossy(&uname).into_owned();
        let password = String::from_utf8_lossy(&passwd).into_owned();
        Ok((username, password))
    }

    /// Emits `[01, 00]`, authorising the client. Callers must have
    /// already validated the credentials returned by `auth_handshake`
    /// via `AuthService::login_client` — this method trusts its caller
    /// and never itself checks credentials.
    pub async fn complete_auth_handshake(&mut self) -> Result<(), ProtoError> {
        self.stream.write_all(&[0x01, 0x00]).await?;
        self.state = ServerState::Authed;
        Ok(())
    }

    /// Reads `[VER, CMD, RSV, ATYP]` plus the address and port. Domain
    /// names are resolved to an IPv4 address via a single blocking DNS
    /// lookup, matching the single-lookup scope in §6.
    ///
    /// Returns `None` on an unsupported CMD/ATYP or a zero-length
    /// domain, leaving state unadvanced so the caller closes the
    /// connection.
    pub async fn get_request(&mut self) -> Result<Option<(Command, Address, u16)>, ProtoError> {
        let mut header = [0u8; 4];
        self.stream.read_exact(&mut header).await?;
        let (version, cmd_byte, _rsv, atyp) = (header[0], header[1], header[2], header[3]);

        if version != 0x05 {
            return Ok(None);
        }

        let cmd = match Command::from_byte(cmd_byte) {
            Some(cmd) => cmd,
            None => return Ok(None),
        };

        let address = match atyp {
            0x01 => {
                let mut octets = [0u8; 4];
                self.stream.read_exact(&mut octets).await?;
                Address::Ipv4(Ipv4Addr::from(octets))
            }
            0x03 => {
                let mut len = [0u8];
                self.stream.read_exact(&mut len).await?;
                if len[0] == 0 {
                    return Ok(None);
                }
                let mut domain = vec![0u8; len[0] as usize];
                self.stream.read_exact(&mut domain).await?;
                let domain = String::from_utf8_lossy(&domain).into_owned();
                Address::Domain(domain)
            }
            _ => return Ok(None),
        };

        let mut port_buf = [0u8; 2];
        self.stream.read_exact(&mut port_buf).await?;
        let port = BigEndian::read_u16(&port_buf);

        self.state = ServerState::RequestRead;
        Ok(Some((cmd, address, port)))
    }

    /// Resolves `address` (if a domain) and dials `(address, port)`.
    /// On success, replies with the bound address/port of the new
    /// upstream socket and returns it ready for splicing. On failure,
    /// sends `REP=0x05` (connection refused, the generic failure code
    /// per §6) and returns the I/O error — per §9, every call site
    /// sends the failure reply rather than silently dropping the
    /// connection.
    pub async fn send_reply(
        &mut self,
        address: &Address,
        port: u16,
    ) -> Result<TcpStream, ProtoError> {
        let resolved = match self.resolve(address, port).await {
            Ok(sock) => sock,
            Err(err) => {
                let buf =
                    Address::encode_reply(0x05, SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0));
                self.stream.write_all(&buf).await?;
                self.state = ServerState::Closed;
                return Err(err);
            }
        };

        let upstream = match TcpStream::connect(resolved).await {
            Ok(sock) => sock,
            Err(err) => {
                let buf =
                    Address::encode_reply(0x05, SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0));
                self.stream.write_all(&buf).await?;
                self.state = ServerState::Closed;
                return Err(ProtoError::Io(err));
            }
        };

        let bound = match upstream.local_addr()? {
            SocketAddr::V4(v4) => v4,
            SocketAddr::V6(_) => SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0),
        };

        let buf = Address::encode_reply(0x00, bound);
        self.stream.write_all(&buf).await?;
        self.state = ServerState::Replied;

        Ok(upstream)
    }

    async fn resolve(&self, address: &Address, port: u16) -> Result<SocketAddr, ProtoError> {
        match address {
            Address::Ipv4(ip) => Ok(SocketAddr::V4(SocketAddrV4::new(*ip, port))),
            Address::Domain(domain) => {
                let mut addrs = tokio::net::lookup_host((domain.as_str(), port)).await?;
                addrs.next().ok_or(ProtoError::DomainNotResolved)
            }
        }
    }

    pub fn mark_splicing(&mut self) {
        self.state = ServerState::Splicing;
    }

    pub fn mark_closed(&mut self) {
        self.state = ServerState::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn nmethods_zero_closes_without_reply() {
        let (mut client, server_side) = duplex(64);
        client.write_all(&[0x05, 0x00]).await.unwrap();

        let mut server = Socks5Server::new(server_side);
        let (ok, user, pass) = server.auth_handshake().await.unwrap();

        assert!(!ok);
        assert!(user.is_none());
        assert!(pass.is_none());
        assert_eq!(server.state(), ServerState::Closed);

        // No reply bytes should have been written back to the client.
        let mut probe = [0u8; 1];
        let read = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            client.read(&mut probe),
        )
        .await;
        assert!(read.is_err(), "server must not reply when NMETHODS == 0");
    }

    #[tokio::test]
    async fn missing_method_0x02_closes_without_reply() {
        let (mut client, server_side) = duplex(64);
        // Offers only method 0x00 (no-auth).
        client.write_all(&[0x05, 0x01, 0x00]).await.unwrap();

        let mut server = Socks5Server::new(server_side);
        let (ok, _, _) = server.auth_handshake().await.unwrap();

        assert!(!ok);
        assert_eq!(server.state(), ServerState::Closed);
    }

    #[tokio::test]
    async fn full_auth_handshake_returns_credentials() {
        let (mut client, server_side) = duplex(256);
        client.write_all(&[0x05, 0x01, 0x02]).await.unwrap();
        client
            .write_all(&[0x01, 5, b'a', b'l', b'i', b'c', b'e', 2, b'p', b'w'])
            .await
            .unwrap();

        let mut server = Socks5Server::new(server_side);
        let (ok, user, pass) = server.auth_handshake().await.unwrap();

        assert!(ok);
        assert_eq!(user.as_deref(), Some("alice"));
        assert_eq!(pass.as_deref(), Some("pw"));
        assert_eq!(server.state(), ServerState::CredsReceived);

        let mut method_reply = [0u8; 2];
        client.read_exact(&mut method_reply).await.unwrap();
        assert_eq!(method_reply, [0x05, 0x02]);
    }

    #[tokio::test]
    async fn complete_auth_handshake_emits_success_bytes() {
        let (mut client, server_side) = duplex(256);
        client.write_all(&[0x05, 0x01, 0x02]).await.unwrap();
        client.write_all(&[0x01, 0, 0, 0]).await.unwrap();

        let mut server = Socks5Server::new(server_side);
        server.auth_handshake().await.unwrap();
        let mut method_reply = [0u8; 2];
        client.read_exact(&mut method_reply).await.unwrap();

        server.complete_auth_handshake().await.unwrap();
        assert_eq!(server.state(), ServerState::Authed);

        let mut success = [0u8; 2];
        client.read_exact(&mut success).await.unwrap();
        assert_eq!(success, [0x01, 0x00]);
    }

    #[tokio::test]
    async fn ipv6_atyp_is_rejected() {
        let (mut client, server_side) = duplex(64);
        client.write_all(&[0x05, 0x01, 0x00, 0x04]).await.unwrap();

        let mut server = Socks5Server::new(server_side);
        let request = server.get_request().await.unwrap();
        assert!(request.is_none());
    }

    #[tokio::test]
    async fn bind_and_associate_commands_are_rejected() {
        for cmd_byte in [0x02u8, 0x03u8] {
            let (mut client, server_side) = duplex(64);
            client
                .write_all(&[0x05, cmd_byte, 0x00, 0x01, 127, 0, 0, 1, 0x00, 0x50])
                .await
                .unwrap();

            let mut server = Socks5Server::new(server_side);
            let request = server.get_request().await.unwrap();
            assert!(request.is_none(), "CMD={:#x} must be rejected", cmd_byte);
        }
    }

    #[tokio::test]
    async fn zero_length_domain_is_rejected() {
        let (mut client, server_side) = duplex(64);
        client.write_all(&[0x05, 0x01, 0x00, 0x03, 0x00]).await.unwrap();

        let mut server = Socks5Server::new(server_side);
        let request = server.get_request().await.unwrap();
        assert!(request.is_none());
    }

    #[tokio::test]
    async fn connect_request_parses_ipv4_and_port() {
        let (mut client, server_side) = duplex(64);
        client
            .write_all(&[0x05, 0x01, 0x00, 0x01, 93, 184, 216, 34, 0x00, 0x50])
            .await
            .unwrap();

        let mut server = Socks5Server::new(server_side);
        let (cmd, address, port) = server.get_request().await.unwrap().unwrap();

        assert_eq!(cmd, Command::Connect);
        assert_eq!(address, Address::Ipv4(Ipv4Addr::new(93, 184, 216, 34)));
        assert_eq!(port, 80);
        assert_eq!(server.state(), ServerState::RequestRead);
    }

    #[tokio::test]
    async fn send_reply_connects_and_replies_success() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let target_addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = listener.accept().await;
        });

        let (mut client, server_side) = duplex(64);
        let mut server = Socks5Server::new(server_side);
        let address = Address::Ipv4(Ipv4Addr::LOCALHOST);

        server.send_reply(&address, target_addr.port()).await.unwrap();
        assert_eq!(server.state(), ServerState::Replied);

        let mut reply = [0u8; 10];
        client.read_exact(&mut reply).await.unwrap();
        assert_eq!(&reply[0..4], &[0x05, 0x00, 0x00, 0x01]);
    }

    #[tokio::test]
    async fn send_reply_on_connect_failure_sends_failure_code() {
        // Nothing listens on this port; connect must fail.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let unused_port = listener.local_addr().unwrap().port();
        drop(listener);

        let (mut client, server_side) = duplex(64);
        let mut server = Socks5Server::new(server_side);
        let address = Address::Ipv4(Ipv4Addr::LOCALHOST);

        let result = server.send_reply(&address, unused_port).await;
        assert!(result.is_err());
        assert_eq!(server.state(), ServerState::Closed);

        let mut reply = [0u8; 10];
        client.read_exact(&mut reply).await.unwrap();
        assert_eq!(reply[1], 0x05);
    }
}
