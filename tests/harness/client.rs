//! Raw client speaking the client side of the protocol.

use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use wirews::protocol::{FrameAccumulator, encode_masked, random_mask_key};
use wirews::{Config, Error, Frame, MessageType, Result, derive_accept_key};

use super::{SAMPLE_KEY, upgrade_request};

pub struct TestClient {
    stream: TcpStream,
    accumulator: FrameAccumulator,
    id: usize,
}

impl TestClient {
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        Self::connect_with_id(addr, 0).await
    }

    /// Connect and complete the opening handshake, checking the accept key.
    pub async fn connect_with_id(addr: SocketAddr, id: usize) -> Result<Self> {
        let mut stream = TcpStream::connect(addr).await?;
        stream.write_all(&upgrade_request("Sec-WebSocket-Key")).await?;

        let mut response = Vec::new();
        let mut byte = [0u8; 1];
        while !response.ends_with(b"\r\n\r\n") {
            if stream.read(&mut byte).await? == 0 {
                return Err(Error::InvalidRequest("no upgrade response".into()));
            }
            response.push(byte[0]);
        }

        let expected = format!("Sec-WebSocket-Accept: {}\r\n", derive_accept_key(SAMPLE_KEY));
        let text = String::from_utf8_lossy(&response);
        if !text.starts_with("HTTP/1.1 101 ") || !text.contains(&expected) {
            return Err(Error::InvalidRequest(text.into_owned()));
        }

        Ok(Self {
            stream,
            accumulator: FrameAccumulator::new(Config::new().with_max_message_size(1 << 20)),
            id,
        })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Send one masked frame.
    pub async fn send(&mut self, payload: &[u8], kind: MessageType) -> Result<()> {
        let wire = encode_masked(payload, kind, random_mask_key());
        self.stream.write_all(&wire).await?;
        Ok(())
    }

    /// Write bytes as-is, without framing.
    pub async fn send_raw(&mut self, data: &[u8]) -> Result<()> {
        self.stream.write_all(data).await?;
        Ok(())
    }

    pub async fn send_text(&mut self, text: &str) -> Result<()> {
        self.send(text.as_bytes(), MessageType::Text).await
    }

    /// Read the next frame, or `None` once the server hangs up.
    pub async fn recv(&mut self) -> Result<Option<Frame>> {
        let mut buf = [0u8; 4096];
        loop {
            if let Some(frame) = self.accumulator.next_frame()? {
                return Ok(Some(frame));
            }
            let n = self.stream.read(&mut buf).await?;
            if n == 0 {
                return Ok(None);
            }
            self.accumulator.push(&buf[..n]);
        }
    }

    pub async fn recv_text(&mut self) -> Result<Option<String>> {
        Ok(self
            .recv()
            .await?
            .map(|frame| String::from_utf8_lossy(frame.payload()).into_owned()))
    }

    /// Send CLOSE with `code` and return the server's reply frame.
    pub async fn close(&mut self, code: u16) -> Result<Option<Frame>> {
        self.send(&code.to_be_bytes(), MessageType::Close).await?;
        self.recv().await
    }
}
