//! Token codec for the directory and peer protocols: UTF-8 text units
//! terminated by a single zero byte, plus bare one-byte status codes.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::utils::{DirshareError, Result};

pub const TERMINATOR: u8 = 0;

/// Writes one token followed by the terminator byte. Tokens must not embed
/// the terminator themselves.
pub async fn send_token<W>(writer: &mut W, token: &str) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    if token.bytes().any(|b| b == TERMINATOR) {
        return Err(DirshareError::MalformedToken);
    }

    writer.write_all(token.as_bytes()).await?;
    writer.write_u8(TERMINATOR).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads bytes up to the next terminator and decodes them as UTF-8.
///
/// End-of-stream before the terminator means the peer hung up
/// ([`DirshareError::ConnectionClosed`]); bytes that fail to decode mean the
/// peer sent garbage ([`DirshareError::MalformedToken`]). Callers abort the
/// session in both cases. The buffered reader keeps any bytes that arrived in
/// the same network read as a preceding status byte, so a coalesced
/// code-plus-token read is handled transparently.
pub async fn read_token<R>(reader: &mut R) -> Result<String>
where
    R: AsyncBufRead + Unpin,
{
    let mut raw = Vec::new();
    let n = reader.read_until(TERMINATOR, &mut raw).await?;
    if n == 0 || raw.last() != Some(&TERMINATOR) {
        return Err(DirshareError::ConnectionClosed);
    }

    raw.pop();
    String::from_utf8(raw).map_err(|_| DirshareError::MalformedToken)
}

/// Reads the single response-code byte that follows a request.
pub async fn read_status<R>(reader: &mut R) -> Result<u8>
where
    R: AsyncBufRead + Unpin,
{
    match reader.read_u8().await {
        Ok(code) => Ok(code),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            Err(DirshareError::ConnectionClosed)
        }
        Err(e) => Err(e.into()),
    }
}
