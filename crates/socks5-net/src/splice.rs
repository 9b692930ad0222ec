use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

/// Size of each read in the splice loop. No reassembly — every chunk is
/// forwarded to the peer as soon as it's read, in the order read.
const BUF_SIZE: usize = 1024;

/// Bounded wait per readiness poll, matching the 500ms `select.select`
/// timeout in the original implementation. Keeps the loop from blocking
/// forever on a direction with no traffic while the other direction is
/// readable, and bounds how long a future cancellation signal would
/// take to be noticed.
const POLL_TIMEOUT: Duration = Duration::from_millis(500);

/// Forwards bytes between `a` and `b` in both directions until either
/// side reads 0 bytes or returns an I/O error. A short write (`send`
/// returning the equivalent of `<= 0`) is also treated as the peer
/// having closed. Neither stream is closed by this function — the
/// caller owns both connections per the Connection data model and is
/// responsible for closing them on return.
pub async fn splice<A, B>(a: &mut A, b: &mut B) -> std::io::Result<()>
where
    A: AsyncRead + AsyncWrite + Unpin,
    B: AsyncRead + AsyncWrite + Unpin,
{
    let mut buf_a = [0u8; BUF_SIZE];
    let mut buf_b = [0u8; BUF_SIZE];

    loop {
        tokio::select! {
            res = timeout(POLL_TIMEOUT, a.read(&mut buf_a)) => {
                match res {
                    Ok(Ok(0)) => return Ok(()),
                    Ok(Ok(n)) => {
                        if b.write_all(&buf_a[..n]).await.is_err() {
                            return Ok(());
                        }
                    }
                    Ok(Err(e)) => return Err(e),
                    Err(_elapsed) => {}
                }
            }
            res = timeout(POLL_TIMEOUT, b.read(&mut buf_b)) => {
                match res {
                    Ok(Ok(0)) => return Ok(()),
                    Ok(Ok(n)) => {
                        if a.write_all(&buf_b[..n]).await.is_err() {
                            return Ok(());
                        }
                    }
                    Ok(Err(e)) => return Err(e),
                    Err(_elapsed) => {}
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn forwards_both_directions_until_either_side_closes() {
        let (mut left_peer, mut left) = duplex(256);
        let (mut right_peer, mut right) = duplex(256);

        left_peer.write_all(b"to the right").await.unwrap();
        right_peer.write_all(b"to the left").await.unwrap();

        let splice_done = tokio::spawn(async move { splice(&mut left, &mut right).await });

        let mut buf = vec![0u8; 12];
        right_peer.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"to the right");

        let mut buf = vec![0u8; 11];
        left_peer.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"to the left");

        drop(left_peer);
        splice_done.await.unwrap().unwrap();
    }
}
