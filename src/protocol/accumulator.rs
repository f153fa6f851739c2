//! Frame reassembly across partial reads.
//!
//! A stream read may return half a header, a header and part of the payload,
//! or one frame followed by the start of the next. [`FrameAccumulator`] buffers
//! bytes until a whole frame is present and keeps any surplus for the next one.

use bytes::{Buf, BytesMut};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::protocol::Frame;
use crate::protocol::frame::{FrameHeader, parse_header};

/// Progress of the frame currently being accumulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AccumulatorState {
    /// Nothing buffered.
    #[default]
    Idle,
    /// Some bytes buffered, header not yet complete.
    AccumulatingHeader,
    /// Header decoded, waiting for the rest of the payload.
    AccumulatingPayload,
    /// A frame was just handed out.
    Complete,
}

impl std::fmt::Display for AccumulatorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccumulatorState::Idle => write!(f, "Idle"),
            AccumulatorState::AccumulatingHeader => write!(f, "AccumulatingHeader"),
            AccumulatorState::AccumulatingPayload => write!(f, "AccumulatingPayload"),
            AccumulatorState::Complete => write!(f, "Complete"),
        }
    }
}

/// Buffers stream bytes and yields whole frames.
#[derive(Debug)]
pub struct FrameAccumulator {
    buffer: BytesMut,
    header: Option<FrameHeader>,
    state: AccumulatorState,
    config: Config,
}

impl FrameAccumulator {
    /// Create an empty accumulator bounded by `config.max_message_size`.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            buffer: BytesMut::with_capacity(config.max_message_size),
            header: None,
            state: AccumulatorState::Idle,
            config,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> AccumulatorState {
        self.state
    }

    /// Number of bytes held but not yet returned as part of a frame.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Append bytes read from the stream.
    pub fn push(&mut self, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        self.buffer.extend_from_slice(data);
        if matches!(
            self.state,
            AccumulatorState::Idle | AccumulatorState::Complete
        ) {
            self.transition(AccumulatorState::AccumulatingHeader);
        }
    }

    /// Return the next complete frame, or `None` if more bytes are needed.
    ///
    /// # Errors
    ///
    /// - `Error::MessageTooLarge` if the header declares a payload above the limit
    /// - `Error::FrameInvalidLength` if the 64-bit length is not legal
    ///
    /// Either error discards everything buffered, since the stream position
    /// can no longer be trusted.
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        let header = match self.header {
            Some(header) => header,
            None => match parse_header(&self.buffer) {
                Ok(header) => {
                    if let Err(e) = self.config.check_message_size(header.payload_len) {
                        self.reset();
                        return Err(e);
                    }
                    self.header = Some(header);
                    header
                }
                Err(Error::FrameTruncated(_)) => {
                    let state = if self.buffer.is_empty() {
                        AccumulatorState::Idle
                    } else {
                        AccumulatorState::AccumulatingHeader
                    };
                    self.transition(state);
                    return Ok(None);
                }
                Err(e) => {
                    self.reset();
                    return Err(e);
                }
            },
        };

        if (self.buffer.len() as u64) < header.frame_len() {
            self.transition(AccumulatorState::AccumulatingPayload);
            return Ok(None);
        }

        let (frame, consumed) = Frame::from_header(header, &self.buffer)?;
        self.buffer.advance(consumed);
        self.header = None;
        self.transition(AccumulatorState::Complete);
        tracing::trace!(
            opcode = frame.opcode,
            len = frame.length,
            leftover = self.buffer.len(),
            "frame complete"
        );
        Ok(Some(frame))
    }

    /// Drop all buffered bytes and return to `Idle`.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.header = None;
        self.transition(AccumulatorState::Idle);
    }

    fn transition(&mut self, next: AccumulatorState) {
        if self.state != next {
            tracing::trace!(from = %self.state, to = %next, "accumulator transition");
            self.state = next;
        }
    }
}
