//! Error types for the WebSocket layer.
//!
//! Every failure the crate reports (handshake, framing, stream I/O, and the
//! peer-initiated close sentinel) is a variant of [`Error`], so callers can
//! match on the kind instead of comparing reason strings.

use thiserror::Error;

use crate::message::CloseFrame;

/// Result type alias for WebSocket operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Which part of a frame was cut short.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Truncation {
    /// Fewer than the two mandatory header bytes.
    Header,
    /// The 16-bit or 64-bit extended length field is incomplete.
    PayloadLength,
    /// The 4-byte masking key is incomplete.
    MaskKey,
    /// The payload is shorter than the declared length.
    Payload,
}

impl Truncation {
    /// Short description used in error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Truncation::Header => "insufficient data for frame",
            Truncation::PayloadLength => "insufficient data for payload length",
            Truncation::MaskKey => "insufficient data for mask key",
            Truncation::Payload => "insufficient data for payload",
        }
    }
}

impl std::fmt::Display for Truncation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur during WebSocket operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The upgrade request carries no `Sec-WebSocket-Key` header.
    #[error("Sec-WebSocket-Key is required")]
    HandshakeMissingKey,

    /// The upgrade request could not be parsed as HTTP.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The upgrade request exceeds the configured handshake size.
    #[error("Handshake too large: {size} bytes (max: {max})")]
    HandshakeTooLarge {
        /// Actual request size.
        size: usize,
        /// Maximum allowed size.
        max: usize,
    },

    /// The buffer ends before the frame does.
    #[error("{0}")]
    FrameTruncated(Truncation),

    /// The 64-bit length field is not a legal payload length.
    #[error("Invalid payload length: {0}")]
    FrameInvalidLength(u64),

    /// The declared payload exceeds the configured maximum message size.
    #[error("Message too large: {size} bytes (max: {max})")]
    MessageTooLarge {
        /// Declared payload size.
        size: u64,
        /// Maximum allowed size.
        max: usize,
    },

    /// Reserved or unknown opcode.
    #[error("Invalid opcode: {0:#x}")]
    InvalidOpcode(u8),

    /// Read, write or shutdown failure on the underlying stream.
    #[error("{context}: {reason}")]
    Io {
        /// What the session was doing when the stream failed.
        context: &'static str,
        /// The underlying error text.
        reason: String,
    },

    /// The peer sent a CLOSE frame. Not a fault: reply with `close` and stop reading.
    #[error("Close signal received")]
    PeerClosed(Option<CloseFrame>),
}

impl Error {
    /// Wrap an I/O failure with the operation that produced it.
    pub(crate) fn io(context: &'static str, err: impl std::fmt::Display) -> Self {
        Error::Io {
            context,
            reason: err.to_string(),
        }
    }

    /// Short, human readable summary of the failure.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Error::Io { context, .. } => (*context).to_string(),
            Error::FrameTruncated(t) => t.as_str().to_string(),
            other => other.to_string(),
        }
    }

    /// Underlying cause, if the error wraps one.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Error::Io { reason, .. } => Some(reason),
            Error::InvalidRequest(reason) => Some(reason),
            Error::PeerClosed(Some(frame)) => Some(&frame.reason),
            _ => None,
        }
    }

    /// Returns `true` for the orderly peer-close sentinel.
    #[must_use]
    pub const fn is_peer_closed(&self) -> bool {
        matches!(self, Error::PeerClosed(_))
    }

    /// Returns `true` for malformed or truncated frames.
    #[must_use]
    pub const fn is_frame_error(&self) -> bool {
        matches!(
            self,
            Error::FrameTruncated(_)
                | Error::FrameInvalidLength(_)
                | Error::MessageTooLarge { .. }
                | Error::InvalidOpcode(_)
        )
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::io("I/O error", err)
    }
}
