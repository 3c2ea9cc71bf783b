//! TCP length-prefixed framing: a DNS-over-TCP message is a big-endian u16
//! length followed by exactly that many bytes of message.
//!
//! Grounded on `src/net_util/mod.rs`'s `read_tcp_bytes`/`TcpError`.

use bytes::BytesMut;
use std::fmt;
use std::io;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

#[derive(Debug)]
pub enum TcpError {
    TooShort { expected: usize, actual: usize },
    Io(io::Error),
}

impl fmt::Display for TcpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TcpError::TooShort { expected, actual } => {
                write!(f, "expected {expected} bytes, connection closed after {actual}")
            }
            TcpError::Io(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for TcpError {}

impl From<io::Error> for TcpError {
    fn from(e: io::Error) -> Self {
        TcpError::Io(e)
    }
}

/// Reads one length-prefixed DNS message from an async byte stream.
pub async fn read_tcp_message<S>(stream: &mut S) -> Result<BytesMut, TcpError>
where
    S: tokio::io::AsyncRead + Unpin,
{
    let expected = stream.read_u16().await? as usize;
    let mut bytes = BytesMut::with_capacity(expected);
    while bytes.len() < expected {
        let n = stream.read_buf(&mut bytes).await?;
        if n == 0 {
            return Err(TcpError::TooShort {
                expected,
                actual: bytes.len(),
            });
        }
    }
    Ok(bytes)
}

/// Writes one length-prefixed DNS message to an async byte stream.
pub async fn write_tcp_message<S>(stream: &mut S, message: &[u8]) -> Result<(), TcpError>
where
    S: tokio::io::AsyncWrite + Unpin,
{
    stream.write_u16(message.len() as u16).await?;
    stream.write_all(message).await?;
    Ok(())
}
