//! Server-side opening handshake over an async stream.
//!
//! All entry points share the same key lookup and response bytes. A request
//! without a client key is rejected before anything is written, so the caller
//! can still answer it with an ordinary HTTP error.
//!
//! The stream is taken by value. To keep it after a failed upgrade, pass
//! `&mut stream` instead; tokio implements the I/O traits for mutable
//! references.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::http::HttpRequest;
use crate::protocol::{HeaderLookup, upgrade_response};
use crate::session::Session;

const CONTEXT: &str = "Error while upgrading connection";

/// Validate `request` and write the `101 Switching Protocols` response.
///
/// Nothing is written if the request carries no client key.
///
/// # Errors
///
/// - `Error::HandshakeMissingKey` if neither key header spelling is present
/// - `Error::Io` if writing the response fails
pub async fn handshake<T, R>(conn: &mut T, request: &R) -> Result<()>
where
    T: AsyncWrite + Unpin + ?Sized,
    R: HeaderLookup + ?Sized,
{
    let response = upgrade_response(request)?;
    conn.write_all(&response)
        .await
        .map_err(|e| Error::io(CONTEXT, e))?;
    conn.flush().await.map_err(|e| Error::io(CONTEXT, e))?;
    tracing::debug!(bytes = response.len(), "upgrade response written");
    Ok(())
}

/// Upgrade `conn` using a request already parsed by the caller.
///
/// # Errors
///
/// See [`handshake`]. On failure the connection is dropped and should be
/// considered unusable for WebSocket traffic.
pub async fn upgrade<T, R>(conn: T, request: &R, config: Config) -> Result<Session<T>>
where
    T: AsyncRead + AsyncWrite + Unpin,
    R: HeaderLookup + ?Sized,
{
    let mut session = Session::handshaking(conn, config);
    handshake(session.io_mut(), request).await?;
    session.open();
    Ok(session)
}

/// Upgrade `conn` using the raw bytes of a request the caller has already read.
///
/// Trailing NUL padding from a fixed-size read buffer is tolerated.
///
/// # Errors
///
/// - `Error::HandshakeTooLarge` if `data` exceeds `max_handshake_size`
/// - `Error::InvalidRequest` if `data` is not a parseable HTTP request
/// - Any error of [`handshake`]
pub async fn upgrade_from_buffer<T>(conn: T, data: &[u8], config: Config) -> Result<Session<T>>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    config.check_handshake_size(data.len())?;
    let request = HttpRequest::parse(data)?;
    let session = upgrade(conn, &request, config).await?;
    tracing::debug!(path = %request.path, "connection upgraded");
    Ok(session)
}

/// Read the upgrade request off `conn`, then upgrade it.
///
/// The request head, up to and including the blank line, must fit in
/// `max_handshake_size` bytes. Bytes read past the blank line are kept and
/// decoded as frames by the returned session.
///
/// # Errors
///
/// - `Error::HandshakeTooLarge` if no complete request head fits the limit
/// - `Error::Io` if reading fails or the peer hangs up first (reason `EOF`)
/// - `Error::InvalidRequest` if the request cannot be parsed
/// - Any error of [`handshake`]
pub async fn accept<T>(mut conn: T, config: Config) -> Result<(Session<T>, HttpRequest)>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    let max = config.max_handshake_size;
    // One byte of headroom so an overlong head is detected, not truncated.
    let mut buf = vec![0; max.saturating_add(1)];
    let mut filled = 0;

    let head_len = loop {
        if let Some(end) = find_head_end(&buf[..filled]) {
            break end;
        }
        if filled == buf.len() {
            return Err(Error::HandshakeTooLarge { size: filled, max });
        }
        let n = conn
            .read(&mut buf[filled..])
            .await
            .map_err(|e| Error::io(CONTEXT, e))?;
        if n == 0 {
            return Err(Error::io(CONTEXT, "EOF"));
        }
        filled += n;
    };
    config.check_handshake_size(head_len)?;

    let request = HttpRequest::parse(&buf[..head_len])?;
    let mut session = upgrade(conn, &request, config).await?;
    session.prime(&buf[head_len..filled]);
    tracing::debug!(
        path = %request.path,
        pipelined = filled - head_len,
        "connection accepted"
    );
    Ok((session, request))
}

/// Length of the request head including its terminating blank line.
fn find_head_end(data: &[u8]) -> Option<usize> {
    data.windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|pos| pos + 4)
}
