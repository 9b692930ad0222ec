use super::error::ProtoError;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// The client-role SOCKS5 state machine (§4.1), used by Client-Gateway
/// when it speaks SOCKS5 *to* a Geo-Relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Init,
    MethodsSent,
    MethodAcked,
    AuthSent,
    AuthAcked,
    Ready,
}

/// Client side of a SOCKS5 connection: the symmetrical counterpart to
/// [`super::server::Socks5Server`], advertising method 0x02 only and
/// authenticating with a fixed username/password.
pub struct Socks5Client<S> {
    stream: S,
    state: ClientState,
}

impl<S> Socks5Client<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            state: ClientState::Init,
        }
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    pub fn into_inner(self) -> S {
        self.stream
    }

    /// Emits `[05, 01, 02]` — version 5, one method offered, method
    /// 0x02 (username/password).
    pub async fn send_version_nmethods_methods(&mut self) -> Result<(), ProtoError> {
        self.stream.write_all(&[0x05, 0x01, 0x02]).await?;
        self.state = ClientState::MethodsSent;
        Ok(())
    }

    /// Reads the server's `[05, 02]` method-selection reply.
    pub async fn get_version_method_response(&mut self) -> Result<(), ProtoError> {
        let mut resp = [0u8; 2];
        self.stream.read_exact(&mut resp).await?;
        if resp[0] != 0x05 {
            return Err(ProtoError::UnsupportedVersion(resp[0]));
        }
        if resp[1] != 0x02 {
            return Err(ProtoError::MethodNotOffered);
        }
        self.state = ClientState::MethodAcked;
        Ok(())
    }

    /// Emits `[01, ULEN, UNAME, PLEN, PASSWD]`.
    pub async fn send_auth(&mut self, username: &str, password: &str) -> Result<(), ProtoError> {
        let mut buf = Vec::with_capacity(3 + username.len() + password.len());
        buf.push(0x01);
        buf.push(username.len() as u8);
        buf.extend_from_slice(username.as_bytes());
        buf.push(password.len() as u8);
        buf.extend_from_slice(password.as_bytes());

        self.stream.write_all(&buf).await?;
        self.state = ClientState::AuthSent;
        Ok(())
    }

    /// Reads `[01, STATUS]`; `STATUS == 0` means accepted.
    pub async fn get_auth_response(&mut self) -> Result<(), ProtoError> {
        let mut resp = [0u8; 2];
        self.stream.read_exact(&mut resp).await?;
        if resp[1] != 0x00 {
            self.state = ClientState::Init;
            return Err(ProtoError::AuthRejected);
        }
        self.state = ClientState::Ready;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn greeting_offers_only_method_0x02() {
        let (mut server, client_side) = duplex(64);
        let mut client = Socks5Client::new(client_side);
        client.send_version_nmethods_methods().await.unwrap();

        let mut greeting = [0u8; 3];
        server.read_exact(&mut greeting).await.unwrap();
        assert_eq!(greeting, [0x05, 0x01, 0x02]);
        assert_eq!(client.state(), ClientState::MethodsSent);
    }

    #[tokio::test]
    async fn method_response_other_than_0x02_is_rejected() {
        let (mut server, client_side) = duplex(64);
        let mut client = Socks5Client::new(client_side);
        client.send_version_nmethods_methods().await.unwrap();
        server.write_all(&[0x05, 0x00]).await.unwrap();

        let result = client.get_version_method_response().await;
        assert!(matches!(result, Err(ProtoError::MethodNotOffered)));
    }

    #[tokio::test]
    async fn full_client_handshake_reaches_ready() {
        let (mut server, client_side) = duplex(256);
        let mut client = Socks5Client::new(client_side);

        client.send_version_nmethods_methods().await.unwrap();
        let mut greeting = [0u8; 3];
        server.read_exact(&mut greeting).await.unwrap();
        server.write_all(&[0x05, 0x02]).await.unwrap();
        client.get_version_method_response().await.unwrap();

        client.send_auth("gateway", "gateway").await.unwrap();
        let mut auth_frame = [0u8; 3 + 7 + 7];
        server.read_exact(&mut auth_frame).await.unwrap();
        assert_eq!(auth_frame[0], 0x01);
        assert_eq!(auth_frame[1], 7);
        assert_eq!(&auth_frame[2..9], b"gateway");

        server.write_all(&[0x01, 0x00]).await.unwrap();
        client.get_auth_response().await.unwrap();
        assert_eq!(client.state(), ClientState::Ready);
    }

    #[tokio::test]
    async fn auth_rejection_surfaces_as_error() {
        let (mut server, client_side) = duplex(64);
        let mut client = Socks5Client::new(client_side);
        client.send_version_nmethods_methods().await.unwrap();
        let mut greeting = [0u8; 3];
        server.read_exact(&mut greeting).await.unwrap();
        server.write_all(&[0x05, 0x02]).await.unwrap();
        client.get_version_method_response().await.unwrap();

        client.send_auth("bob", "wrong").await.unwrap();
        let mut auth_frame = [0u8; 3 + 3 + 5];
        server.read_exact(&mut auth_frame).await.unwrap();
        server.write_all(&[0x01, 0x01]).await.unwrap();

        let result = client.get_auth_response().await;
        assert!(matches!(result, Err(ProtoError::AuthRejected)));
        assert_eq!(client.state(), ClientState::Init);
    }
}
