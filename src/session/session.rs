use tokio::io::{AsyncRead, AsyncWrite};

use crate::codec::WebSocketCodec;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::message::{CloseCode, CloseFrame};
use crate::protocol::{Frame, MessageType};
use crate::session::SessionState;

/// A server-side WebSocket session bound to one connection.
///
/// A `Session` is normally obtained from [`upgrade`](crate::upgrade),
/// [`upgrade_from_buffer`](crate::upgrade_from_buffer) or
/// [`accept`](crate::accept), which write the `101 Switching Protocols`
/// response before handing it out in the `Open` state.
///
/// Outgoing frames are never masked or fragmented. Incoming frames may span
/// several reads; bytes past the end of one frame are kept for the next
/// [`receive`](Session::receive).
///
/// A `Session` is not internally synchronized. Drive it from one task, or
/// serialize access to it in the surrounding application.
///
/// ## Example
///
/// ```rust,ignore
/// use wirews::{Config, accept};
///
/// let (stream, _) = listener.accept().await?;
/// let (mut session, request) = accept(stream, Config::default()).await?;
///
/// loop {
///     match session.receive().await {
///         Ok(payload) => session.send_bytes(&payload).await?,
///         Err(e) if e.is_peer_closed() => break,
///         Err(e) => return Err(e),
///     }
/// }
/// session.close("bye", 1000).await?;
/// ```
pub struct Session<T> {
    codec: WebSocketCodec<T>,
    state: SessionState,
}

impl<T> Session<T> {
    /// Wrap a stream whose handshake has already been completed.
    ///
    /// The session starts out `Open`.
    #[must_use]
    pub fn new(io: T, config: Config) -> Self {
        Self {
            codec: WebSocketCodec::new(io, config),
            state: SessionState::Open,
        }
    }

    /// Like [`Session::new`], with bytes already read past the handshake.
    #[must_use]
    pub fn with_buffered(io: T, config: Config, buffered: &[u8]) -> Self {
        let mut session = Self::new(io, config);
        session.codec.prime(buffered);
        session
    }

    pub(crate) fn handshaking(io: T, config: Config) -> Self {
        Self {
            codec: WebSocketCodec::new(io, config),
            state: SessionState::Handshaking,
        }
    }

    pub(crate) fn io_mut(&mut self) -> &mut T {
        self.codec.get_mut()
    }

    pub(crate) fn prime(&mut self, buffered: &[u8]) {
        self.codec.prime(buffered);
    }

    pub(crate) fn open(&mut self) {
        self.transition(SessionState::Open);
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Returns `true` while messages may be sent and received.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state.is_open()
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        self.codec.config()
    }

    /// Reference to the underlying stream.
    #[must_use]
    pub fn get_ref(&self) -> &T {
        self.codec.get_ref()
    }

    /// Give up the session and return the underlying stream.
    ///
    /// Bytes buffered but not yet decoded are discarded.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.codec.into_inner()
    }

    fn transition(&mut self, next: SessionState) {
        if self.state != next {
            tracing::trace!(from = %self.state, to = %next, "session transition");
            self.state = next;
        }
    }

    fn ensure_open(&self, context: &'static str) -> Result<()> {
        if self.state.is_open() {
            Ok(())
        } else {
            Err(Error::io(context, "session is not open"))
        }
    }

    /// Move to `Closing` if `result` is a failure.
    fn track<R>(&mut self, result: Result<R>) -> Result<R> {
        if result.is_err() && self.state.is_open() {
            self.transition(SessionState::Closing);
        }
        result
    }
}

impl<T: AsyncRead + AsyncWrite + Unpin> Session<T> {
    /// Send `text` as a single TEXT frame.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the session is not open or the write fails.
    pub async fn send(&mut self, text: &str) -> Result<()> {
        self.send_typed(text.as_bytes(), MessageType::Text).await
    }

    /// Send `data` as a single BINARY frame.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the session is not open or the write fails.
    pub async fn send_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.send_typed(data, MessageType::Binary).await
    }

    /// Send `data` as a single frame of type `kind`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the session is not open or the write fails.
    pub async fn send_typed(&mut self, data: &[u8], kind: MessageType) -> Result<()> {
        self.ensure_open("Error sending message")?;
        let result = self.codec.write_message(data, kind).await;
        self.track(result)
    }

    pub async fn ping(&mut self, data: &[u8]) -> Result<()> {
        self.send_typed(data, MessageType::Ping).await
    }

    pub async fn pong(&mut self, data: &[u8]) -> Result<()> {
        self.send_typed(data, MessageType::Pong).await
    }

    /// Receive the next frame, whatever its opcode.
    ///
    /// Unlike [`receive`](Session::receive), a CLOSE frame is returned as a
    /// frame rather than an error, and the session is left `Open`.
    ///
    /// # Errors
    ///
    /// - `Error::Io` if the session is not open, the read fails or the peer
    ///   hung up (reason `EOF`)
    /// - `Error::MessageTooLarge` if the declared payload exceeds
    ///   `max_message_size`
    /// - `Error::FrameInvalidLength` for a malformed 64-bit length
    pub async fn receive_frame(&mut self) -> Result<Frame> {
        self.ensure_open("Error reading message")?;
        let result = self.codec.read_frame().await;
        self.track(result)
    }

    /// Receive the payload of the next frame.
    ///
    /// Payloads are returned as raw bytes for every opcode other than CLOSE;
    /// TEXT payloads are not checked for valid UTF-8.
    ///
    /// # Errors
    ///
    /// - `Error::PeerClosed` carrying the parsed close frame when the peer
    ///   sends CLOSE. This is not a transport fault; answer it with
    ///   [`close`](Session::close).
    /// - Any error of [`receive_frame`](Session::receive_frame).
    ///
    /// The session is `Closing` after any error.
    pub async fn receive(&mut self) -> Result<Vec<u8>> {
        let frame = self.receive_frame().await?;
        if frame.is_close() {
            let close = CloseFrame::parse(frame.payload());
            tracing::debug!(
                code = close.as_ref().map(|c| c.code.as_u16()),
                "close signal received"
            );
            self.transition(SessionState::Closing);
            return Err(Error::PeerClosed(close));
        }
        Ok(frame.into_payload())
    }

    /// Send a CLOSE frame carrying `code` and `reason`, then shut the
    /// stream down.
    ///
    /// Shutdown is attempted even when the close frame could not be written.
    /// The session is `Closed` afterwards regardless of outcome; closing an
    /// already closed session does nothing.
    ///
    /// # Errors
    ///
    /// The write error if the close frame could not be sent, otherwise the
    /// shutdown error, both as `Error::Io`.
    pub async fn close(&mut self, reason: &str, code: u16) -> Result<()> {
        if self.state == SessionState::Closed {
            return Ok(());
        }
        self.transition(SessionState::Closing);

        let payload = CloseFrame::new(CloseCode::from_u16(code), reason).encode();
        let written = self.codec.write_message(&payload, MessageType::Close).await;
        if let Err(e) = &written {
            tracing::warn!(error = %e, "close frame not sent, shutting down anyway");
        }
        let shutdown = self.codec.shutdown().await;

        self.transition(SessionState::Closed);
        tracing::debug!(code, reason, "session closed");
        written.and(shutdown)
    }
}

impl<T> std::fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("config", self.codec.config())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::mock::MockStream;
    use crate::protocol::{decode, encode_masked};

    fn session(data: Vec<u8>) -> Session<MockStream> {
        Session::new(MockStream::new(data), Config::default())
    }

    #[test]
    fn test_session_new() {
        let session = session(vec![]);
        assert_eq!(session.state(), SessionState::Open);
        assert!(session.is_open());
        assert_eq!(session.config().max_message_size, 1024);
    }

    #[tokio::test]
    async fn test_send_text() {
        let mut session = session(vec![]);
        session.send("Hello").await.unwrap();

        let written = &session.get_ref().written;
        assert_eq!(written[0], 0x81);
        assert_eq!(written[1], 5);
        assert_eq!(&written[2..], b"Hello");
    }

    #[tokio::test]
    async fn test_send_bytes() {
        let mut session = session(vec![]);
        session.send_bytes(&[1, 2, 3]).await.unwrap();

        assert_eq!(session.get_ref().written, vec![0x82, 0x03, 1, 2, 3]);
    }

    #[tokio::test]
    async fn test_ping_pong() {
        let mut session = session(vec![]);
        session.ping(b"p").await.unwrap();
        session.pong(b"q").await.unwrap();

        assert_eq!(
            session.get_ref().written,
            vec![0x89, 0x01, b'p', 0x8A, 0x01, b'q']
        );
    }

    #[tokio::test]
    async fn test_send_large_uses_extended_length() {
        let mut session = session(vec![]);
        session.send_bytes(&[0; 300]).await.unwrap();

        let written = &session.get_ref().written;
        assert_eq!(&written[..4], &[0x82, 126, 0x01, 0x2C]);
        assert_eq!(written.len(), 304);
    }

    #[tokio::test]
    async fn test_receive_masked_text() {
        let wire = encode_masked(b"Hello", MessageType::Text, [0x37, 0xfa, 0x21, 0x3d]);
        let mut session = session(wire);

        assert_eq!(session.receive().await.unwrap(), b"Hello");
        assert!(session.is_open());
    }

    #[tokio::test]
    async fn test_receive_returns_ping_payload() {
        let wire = encode_masked(b"ping", MessageType::Ping, [9, 9, 9, 9]);
        let mut session = session(wire);

        assert_eq!(session.receive().await.unwrap(), b"ping");
    }

    #[tokio::test]
    async fn test_receive_frame_keeps_opcode() {
        let wire = encode_masked(b"x", MessageType::Binary, [1, 2, 3, 4]);
        let mut session = session(wire);

        let frame = session.receive_frame().await.unwrap();
        assert_eq!(frame.opcode, 0x2);
        assert!(frame.masked());
    }

    #[tokio::test]
    async fn test_receive_close_signal() {
        let wire = encode_masked(&[0x03, 0xE9, b'g', b'o'], MessageType::Close, [4, 3, 2, 1]);
        let mut session = session(wire);

        let err = session.receive().await.unwrap_err();
        assert!(err.is_peer_closed());
        assert_eq!(err.to_string(), "Close signal received");
        assert_eq!(
            err,
            Error::PeerClosed(Some(CloseFrame::new(CloseCode::GoingAway, "go")))
        );
        assert_eq!(session.state(), SessionState::Closing);
    }

    #[tokio::test]
    async fn test_receive_close_without_status() {
        let wire = encode_masked(&[], MessageType::Close, [4, 3, 2, 1]);
        let mut session = session(wire);

        assert_eq!(session.receive().await, Err(Error::PeerClosed(None)));
    }

    #[tokio::test]
    async fn test_receive_eof_moves_to_closing() {
        let mut session = session(vec![]);

        let err = session.receive().await.unwrap_err();
        assert_eq!(err, Error::io("Error reading message", "EOF"));
        assert_eq!(session.state(), SessionState::Closing);
    }

    #[tokio::test]
    async fn test_receive_oversized_moves_to_closing() {
        let wire = encode_masked(&[0; 2000], MessageType::Binary, [1, 1, 1, 1]);
        let mut session = session(wire);

        let err = session.receive().await.unwrap_err();
        assert_eq!(err, Error::MessageTooLarge { size: 2000, max: 1024 });
        assert_eq!(session.state(), SessionState::Closing);
    }

    #[tokio::test]
    async fn test_receive_when_not_open() {
        let mut session = session(vec![]);
        session.close("", 1000).await.unwrap();

        let err = session.receive().await.unwrap_err();
        assert_eq!(err.message(), "Error reading message");
        assert_eq!(err.reason(), Some("session is not open"));
    }

    #[tokio::test]
    async fn test_send_when_not_open() {
        let mut session = session(vec![]);
        let _ = session.receive().await;

        let err = session.send("late").await.unwrap_err();
        assert_eq!(err, Error::io("Error sending message", "session is not open"));
        assert!(session.get_ref().written.is_empty());
    }

    #[tokio::test]
    async fn test_send_failure_moves_to_closing() {
        let mut session = Session::new(MockStream::failing_writes(), Config::default());

        let err = session.send("x").await.unwrap_err();
        assert_eq!(err.message(), "Error sending message");
        assert_eq!(session.state(), SessionState::Closing);
    }

    #[tokio::test]
    async fn test_close_frame_bytes() {
        let mut session = session(vec![]);
        session.close("bye", 1000).await.unwrap();

        let written = &session.get_ref().written;
        let frame = decode(written).unwrap();
        assert!(frame.is_close());
        assert_eq!(frame.payload(), &[0x03, 0xE8, b'b', b'y', b'e']);
        assert!(session.get_ref().shutdown_called);
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn test_close_shuts_down_after_failed_write() {
        let mut session = Session::new(MockStream::failing_writes(), Config::default());

        let err = session.close("bye", 1000).await.unwrap_err();
        assert_eq!(err.message(), "Error sending close signal");
        assert!(session.get_ref().shutdown_called);
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn test_close_reports_shutdown_failure() {
        let mut stream = MockStream::new(vec![]);
        stream.fail_shutdown = true;
        let mut session = Session::new(stream, Config::default());

        let err = session.close("", 1001).await.unwrap_err();
        assert_eq!(err.message(), "Error closing connection");
        assert_eq!(err.reason(), Some("not connected"));
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn test_close_twice_is_noop() {
        let mut session = session(vec![]);
        session.close("bye", 1000).await.unwrap();
        let len = session.get_ref().written.len();

        session.close("again", 1000).await.unwrap();
        assert_eq!(session.get_ref().written.len(), len);
    }

    #[tokio::test]
    async fn test_close_after_peer_closed() {
        let wire = encode_masked(&[0x03, 0xE8], MessageType::Close, [0, 0, 0, 0]);
        let mut session = session(wire);
        assert!(session.receive().await.unwrap_err().is_peer_closed());

        session.close("", 1000).await.unwrap();
        assert_eq!(session.get_ref().written, vec![0x88, 0x02, 0x03, 0xE8]);
    }

    #[tokio::test]
    async fn test_with_buffered_bytes() {
        let wire = encode_masked(b"early", MessageType::Text, [1, 2, 3, 4]);
        let mut session = Session::with_buffered(MockStream::new(vec![]), Config::default(), &wire);

        assert_eq!(session.receive().await.unwrap(), b"early");
    }

    #[tokio::test]
    async fn test_frames_split_across_reads() {
        let mut wire = encode_masked(b"first", MessageType::Text, [1, 2, 3, 4]);
        wire.extend(encode_masked(b"second", MessageType::Binary, [5, 6, 7, 8]));
        let chunks = wire.chunks(3).map(<[u8]>::to_vec).collect();
        let mut session = Session::new(MockStream::chunked(chunks), Config::default());

        assert_eq!(session.receive().await.unwrap(), b"first");
        assert_eq!(session.receive().await.unwrap(), b"second");
    }
}
