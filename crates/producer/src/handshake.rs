use byteorder::{BigEndian, ByteOrder};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Sends `[LEN:u32 BE][KEY bytes]` and reads the 1-byte accept/reject
/// status, per the Producer API-key frame in §6.
pub async fn relay_handshake(stream: &mut TcpStream, api_key: &str) -> std::io::Result<bool> {
    let key_bytes = api_key.as_bytes();
    let mut packet = Vec::with_capacity(4 + key_bytes.len());
    packet.extend_from_slice(&[0u8; 4]);
    BigEndian::write_u32(&mut packet[0..4], key_bytes.len() as u32);
    packet.extend_from_slice(key_bytes);

    stream.write_all(&packet).await?;

    let mut status = [0u8; 1];
    stream.read_exact(&mut status).await?;
    Ok(status[0] == 1)
}
