use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::protocol::{Frame, FrameAccumulator, MessageType, encode_into, encoded_len};

/// Frame-level I/O over a byte stream.
///
/// Reads go through a fixed `max_message_size` buffer into a
/// [`FrameAccumulator`], so a frame split across reads is still returned
/// whole. Writes encode into a reusable buffer and are flushed immediately.
pub struct WebSocketCodec<T> {
    io: T,
    read_buf: Vec<u8>,
    write_buf: BytesMut,
    accumulator: FrameAccumulator,
    config: Config,
}

impl<T> WebSocketCodec<T> {
    #[must_use]
    pub fn new(io: T, config: Config) -> Self {
        Self {
            io,
            read_buf: vec![0; config.max_message_size.max(1)],
            write_buf: BytesMut::new(),
            accumulator: FrameAccumulator::new(config),
            config,
        }
    }

    /// Feed bytes that were read off the stream before the codec existed,
    /// e.g. a frame pipelined right behind the upgrade request.
    pub fn prime(&mut self, data: &[u8]) {
        self.accumulator.push(data);
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn accumulator(&self) -> &FrameAccumulator {
        &self.accumulator
    }

    #[must_use]
    pub fn get_ref(&self) -> &T {
        &self.io
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.io
    }

    #[must_use]
    pub fn into_inner(self) -> T {
        self.io
    }
}

impl<T: AsyncRead + AsyncWrite + Unpin> WebSocketCodec<T> {
    /// Read until one whole frame is available and return it.
    ///
    /// A read of zero bytes is reported as `Error::Io` with reason `EOF`.
    pub async fn read_frame(&mut self) -> Result<Frame> {
        loop {
            if let Some(frame) = self.accumulator.next_frame()? {
                return Ok(frame);
            }

            let n = self
                .io
                .read(&mut self.read_buf)
                .await
                .map_err(|e| Error::io("Error reading message", e))?;
            if n == 0 {
                return Err(Error::io("Error reading message", "EOF"));
            }
            tracing::trace!(bytes = n, state = %self.accumulator.state(), "read from stream");
            self.accumulator.push(&self.read_buf[..n]);
        }
    }

    /// Encode `payload` as a single frame of type `kind` and write it out.
    pub async fn write_message(&mut self, payload: &[u8], kind: MessageType) -> Result<()> {
        let context = match kind {
            MessageType::Close => "Error sending close signal",
            _ => "Error sending message",
        };

        self.write_buf.clear();
        self.write_buf.reserve(encoded_len(payload.len(), false));
        encode_into(&mut self.write_buf, payload, kind);

        self.io
            .write_all(&self.write_buf)
            .await
            .map_err(|e| Error::io(context, e))?;
        self.io.flush().await.map_err(|e| Error::io(context, e))?;
        tracing::debug!(opcode = %kind.opcode(), len = payload.len(), "frame written");
        Ok(())
    }

    /// Shut down the write half of the underlying stream.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.io
            .shutdown()
            .await
            .map_err(|e| Error::io("Error closing connection", e))
    }
}
