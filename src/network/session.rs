use log::debug;
use std::net::SocketAddr;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use crate::network::wire;
use crate::utils::{DirshareError, Result};

/// One TCP connection carrying one request/response exchange.
///
/// A session is owned by the operation that opened it and is closed by drop
/// on every exit path; it is never reused. Reads go through a buffered
/// reader, so a status byte and trailing token bytes delivered in the same
/// segment stay available to later reads.
#[derive(Debug)]
pub struct Session {
    stream: BufReader<TcpStream>,
}

impl Session {
    pub async fn open(addr: &str) -> Result<Self> {
        let stream = TcpStream::connect(addr).await.map_err(|e| {
            DirshareError::ConnectionFailed(format!("failed to connect to {}: {}", addr, e))
        })?;

        debug!("session opened to {}", addr);
        Ok(Self::new(stream))
    }

    pub fn new(stream: TcpStream) -> Self {
        Self {
            stream: BufReader::new(stream),
        }
    }

    pub fn peer_addr(&self) -> Result<SocketAddr> {
        Ok(self.stream.get_ref().peer_addr()?)
    }

    pub async fn send_token(&mut self, token: &str) -> Result<()> {
        wire::send_token(&mut self.stream, token).await
    }

    pub async fn read_token(&mut self) -> Result<String> {
        wire::read_token(&mut self.stream).await
    }

    pub async fn read_status(&mut self) -> Result<u8> {
        wire::read_status(&mut self.stream).await
    }

    pub async fn send_status(&mut self, code: u8) -> Result<()> {
        self.stream.write_u8(code).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Reads one token holding a decimal count or size.
    pub async fn read_count(&mut self) -> Result<u64> {
        let token = self.read_token().await?;
        token
            .trim()
            .parse::<u64>()
            .map_err(|_| DirshareError::MalformedToken)
    }

    /// Reads up to `buf.len()` raw bytes; 0 means end of stream.
    pub async fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize> {
        Ok(self.stream.read(buf).await?)
    }

    /// Streams raw bytes from `reader` into the session until EOF.
    pub async fn send_from<R>(&mut self, reader: &mut R) -> Result<u64>
    where
        R: AsyncRead + Unpin,
    {
        let sent = tokio::io::copy(reader, &mut self.stream).await?;
        self.stream.flush().await?;
        Ok(sent)
    }
}
