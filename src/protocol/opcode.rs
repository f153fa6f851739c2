//! Frame opcodes and the message types the encoder produces.

use crate::error::{Error, Result};

/// WebSocket frame opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
#[non_exhaustive]
pub enum OpCode {
    /// Continuation frame (0x0). Recognized on decode, never produced.
    Continuation = 0x0,
    /// Text frame (0x1).
    Text = 0x1,
    /// Binary frame (0x2).
    Binary = 0x2,
    /// Close frame (0x8).
    Close = 0x8,
    /// Ping frame (0x9).
    Ping = 0x9,
    /// Pong frame (0xA).
    Pong = 0xA,
}

impl OpCode {
    /// Create OpCode from raw 4-bit value.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidOpcode` for reserved values (0x3-0x7, 0xB-0xF)
    /// and anything that does not fit in four bits.
    pub const fn from_u8(byte: u8) -> Result<Self> {
        match byte {
            0x0 => Ok(OpCode::Continuation),
            0x1 => Ok(OpCode::Text),
            0x2 => Ok(OpCode::Binary),
            0x8 => Ok(OpCode::Close),
            0x9 => Ok(OpCode::Ping),
            0xA => Ok(OpCode::Pong),
            other => Err(Error::InvalidOpcode(other)),
        }
    }

    /// Convert OpCode to raw byte value.
    #[inline]
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Close, Ping and Pong are control frames.
    #[inline]
    #[must_use]
    pub const fn is_control(self) -> bool {
        matches!(self, OpCode::Close | OpCode::Ping | OpCode::Pong)
    }

    /// Get human-readable name for this opcode.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            OpCode::Continuation => "Continuation",
            OpCode::Text => "Text",
            OpCode::Binary => "Binary",
            OpCode::Close => "Close",
            OpCode::Ping => "Ping",
            OpCode::Pong => "Pong",
        }
    }
}

impl TryFrom<u8> for OpCode {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        OpCode::from_u8(value)
    }
}

impl std::fmt::Display for OpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Kind of application message handed to the encoder.
///
/// Maps one-to-one onto the opcodes the encoder emits; continuation frames
/// are never produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MessageType {
    /// UTF-8 text (0x1).
    #[default]
    Text,
    /// Arbitrary bytes (0x2).
    Binary,
    /// Ping (0x9).
    Ping,
    /// Pong (0xA).
    Pong,
    /// Close (0x8).
    Close,
}

impl MessageType {
    /// Wire opcode for this message type.
    #[inline]
    #[must_use]
    pub const fn opcode(self) -> OpCode {
        match self {
            MessageType::Text => OpCode::Text,
            MessageType::Binary => OpCode::Binary,
            MessageType::Ping => OpCode::Ping,
            MessageType::Pong => OpCode::Pong,
            MessageType::Close => OpCode::Close,
        }
    }
}

impl From<MessageType> for OpCode {
    fn from(kind: MessageType) -> Self {
        kind.opcode()
    }
}

impl TryFrom<OpCode> for MessageType {
    type Error = Error;

    fn try_from(opcode: OpCode) -> Result<Self> {
        match opcode {
            OpCode::Text => Ok(MessageType::Text),
            OpCode::Binary => Ok(MessageType::Binary),
            OpCode::Ping => Ok(MessageType::Ping),
            OpCode::Pong => Ok(MessageType::Pong),
            OpCode::Close => Ok(MessageType::Close),
            OpCode::Continuation => Err(Error::InvalidOpcode(OpCode::Continuation.as_u8())),
        }
    }
}
