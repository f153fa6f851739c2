//! WebSocket frame encoding and decoding.
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-------+-+-------------+-------------------------------+
//! |F|R|R|R| opcode|M| Payload len |    Extended payload length    |
//! |I|S|S|S|  (4)  |A|     (7)     |             (16/64)           |
//! |N|V|V|V|       |S|             |   (if payload len==126/127)   |
//! | |1|2|3|       |K|             |                               |
//! +-+-+-+-+-------+-+-------------+-------------------------------+
//! |                 Masking key (if MASK is set)                  |
//! +---------------------------------------------------------------+
//! |                          Payload data                         |
//! +---------------------------------------------------------------+
//! ```
//!
//! The encoder always emits a single final frame with no RSV bits. Server
//! frames are sent unmasked; [`encode_masked`] exists for the client side.

use bytes::BufMut;

use crate::error::{Error, Result, Truncation};
use crate::protocol::mask::apply_mask_fast;
use crate::protocol::{MessageType, OpCode};

const FIN_BIT: u8 = 0x80;
const RSV1_BIT: u8 = 0x40;
const RSV2_BIT: u8 = 0x20;
const RSV3_BIT: u8 = 0x10;
const OPCODE_MASK: u8 = 0x0F;
const MASK_BIT: u8 = 0x80;
const LENGTH_MASK: u8 = 0x7F;

/// Largest payload that fits in the 7-bit length field.
pub const MAX_SHORT_PAYLOAD: usize = 125;

/// Largest payload that fits in the 16-bit extended length field.
pub const MAX_MEDIUM_PAYLOAD: usize = 0xFFFF;

const LENGTH_16: u8 = 126;
const LENGTH_64: u8 = 127;

/// Fixed-size part of a frame, decoded from its first bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FrameHeader {
    pub fin: bool,
    pub rsv1: bool,
    pub rsv2: bool,
    pub rsv3: bool,
    pub opcode: u8,
    pub mask: Option<[u8; 4]>,
    pub payload_len: u64,
    /// Bytes taken by the header, masking key included.
    pub header_len: usize,
}

impl FrameHeader {
    /// Total wire size of the frame this header introduces.
    pub fn frame_len(&self) -> u64 {
        self.header_len as u64 + self.payload_len
    }
}

/// Decode the frame header at the start of `buf`.
///
/// # Errors
///
/// - `Error::FrameTruncated` if `buf` ends inside the header
/// - `Error::FrameInvalidLength` if the 64-bit length has its top bit set
pub(crate) fn parse_header(buf: &[u8]) -> Result<FrameHeader> {
    let [byte0, byte1, rest @ ..] = buf else {
        return Err(Error::FrameTruncated(Truncation::Header));
    };

    let fin = byte0 & FIN_BIT != 0;
    let rsv1 = byte0 & RSV1_BIT != 0;
    let rsv2 = byte0 & RSV2_BIT != 0;
    let rsv3 = byte0 & RSV3_BIT != 0;
    let opcode = byte0 & OPCODE_MASK;

    let masked = byte1 & MASK_BIT != 0;
    let (payload_len, mut header_len) = match byte1 & LENGTH_MASK {
        LENGTH_16 => {
            let [hi, lo, ..] = rest else {
                return Err(Error::FrameTruncated(Truncation::PayloadLength));
            };
            (u64::from(u16::from_be_bytes([*hi, *lo])), 4)
        }
        LENGTH_64 => {
            let Some(len_bytes) = rest.first_chunk::<8>() else {
                return Err(Error::FrameTruncated(Truncation::PayloadLength));
            };
            let len = u64::from_be_bytes(*len_bytes);
            if len & (1 << 63) != 0 {
                return Err(Error::FrameInvalidLength(len));
            }
            (len, 10)
        }
        short => (u64::from(short), 2),
    };

    let mask = if masked {
        let Some(key) = buf[header_len..].first_chunk::<4>() else {
            return Err(Error::FrameTruncated(Truncation::MaskKey));
        };
        header_len += 4;
        Some(*key)
    } else {
        None
    };

    Ok(FrameHeader {
        fin,
        rsv1,
        rsv2,
        rsv3,
        opcode,
        mask,
        payload_len,
        header_len,
    })
}

/// A decoded WebSocket frame.
///
/// The payload is always exposed unmasked; `mask_key` only records the key
/// the peer used on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Final fragment flag.
    pub fin: bool,
    /// Reserved bit 1 (parsed, unused).
    pub rsv1: bool,
    /// Reserved bit 2 (parsed, unused).
    pub rsv2: bool,
    /// Reserved bit 3 (parsed, unused).
    pub rsv3: bool,
    /// Raw 4-bit opcode.
    pub opcode: u8,
    /// Declared payload length.
    pub length: u64,
    /// Masking key, present only if the frame was masked.
    pub mask_key: Option<[u8; 4]>,
    /// Payload bytes, `length` long and already unmasked.
    pub payload: Vec<u8>,
}

impl Frame {
    /// Decode one frame from the start of `buf`.
    ///
    /// Returns the frame and the number of bytes it occupied. Bytes past the
    /// end of the frame are left untouched.
    ///
    /// # Errors
    ///
    /// - `Error::FrameTruncated` if `buf` ends before the frame does
    /// - `Error::FrameInvalidLength` if the declared length is not representable
    pub fn parse(buf: &[u8]) -> Result<(Self, usize)> {
        let header = parse_header(buf)?;
        Self::from_header(header, buf)
    }

    /// Build a frame from an already-parsed header and the buffer it came from.
    pub(crate) fn from_header(header: FrameHeader, buf: &[u8]) -> Result<(Self, usize)> {
        if (buf.len() as u64) < header.frame_len() {
            return Err(Error::FrameTruncated(Truncation::Payload));
        }
        let total = usize::try_from(header.frame_len())
            .map_err(|_| Error::FrameInvalidLength(header.payload_len))?;

        let mut payload = buf[header.header_len..total].to_vec();
        if let Some(mask) = header.mask {
            apply_mask_fast(&mut payload, mask);
        }

        let frame = Frame {
            fin: header.fin,
            rsv1: header.rsv1,
            rsv2: header.rsv2,
            rsv3: header.rsv3,
            opcode: header.opcode,
            length: header.payload_len,
            mask_key: header.mask,
            payload,
        };
        Ok((frame, total))
    }

    /// Whether the payload was masked on the wire.
    #[inline]
    #[must_use]
    pub const fn masked(&self) -> bool {
        self.mask_key.is_some()
    }

    /// Interpret the raw opcode.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidOpcode` for reserved opcodes.
    pub const fn kind(&self) -> Result<OpCode> {
        OpCode::from_u8(self.opcode)
    }

    /// Returns `true` if this is a CLOSE frame.
    #[inline]
    #[must_use]
    pub const fn is_close(&self) -> bool {
        self.opcode == OpCode::Close.as_u8()
    }

    /// Get the payload bytes.
    #[inline]
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Take ownership of the payload.
    #[must_use]
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }
}

/// Decode a complete frame held in one contiguous buffer.
///
/// Partial frames are not reassembled here; feed a
/// [`FrameAccumulator`](crate::protocol::FrameAccumulator) for that.
///
/// # Errors
///
/// See [`Frame::parse`].
pub fn decode(data: &[u8]) -> Result<Frame> {
    Frame::parse(data).map(|(frame, _)| frame)
}

/// Number of bytes [`encode`] produces for a payload of `payload_len` bytes.
#[must_use]
pub const fn encoded_len(payload_len: usize, masked: bool) -> usize {
    let extended = if payload_len <= MAX_SHORT_PAYLOAD {
        0
    } else if payload_len <= MAX_MEDIUM_PAYLOAD {
        2
    } else {
        8
    };
    let mask = if masked { 4 } else { 0 };
    2 + extended + mask + payload_len
}

/// Append the frame header for `payload_len` bytes of `kind` to `buf`.
fn put_header<B: BufMut>(buf: &mut B, kind: MessageType, payload_len: usize, masked: bool) {
    buf.put_u8(FIN_BIT | kind.opcode().as_u8());

    let mask_bit = if masked { MASK_BIT } else { 0 };
    if payload_len <= MAX_SHORT_PAYLOAD {
        buf.put_u8(mask_bit | payload_len as u8);
    } else if payload_len <= MAX_MEDIUM_PAYLOAD {
        buf.put_u8(mask_bit | LENGTH_16);
        buf.put_u16(payload_len as u16);
    } else {
        buf.put_u8(mask_bit | LENGTH_64);
        buf.put_u64(payload_len as u64);
    }
}

/// Append an unmasked, final frame carrying `payload` to `buf`.
pub fn encode_into<B: BufMut>(buf: &mut B, payload: &[u8], kind: MessageType) {
    put_header(buf, kind, payload.len(), false);
    buf.put_slice(payload);
}

/// Encode `payload` as a single unmasked, final frame of type `kind`.
///
/// # Example
///
/// ```
/// use wirews::protocol::{encode, MessageType};
///
/// assert_eq!(encode(b"Hi", MessageType::Text), vec![0x81, 0x02, b'H', b'i']);
/// ```
#[must_use]
pub fn encode(payload: &[u8], kind: MessageType) -> Vec<u8> {
    let mut buf = Vec::with_capacity(encoded_len(payload.len(), false));
    encode_into(&mut buf, payload, kind);
    buf
}

/// Encode `payload` as a masked frame, as a client would send it.
#[must_use]
pub fn encode_masked(payload: &[u8], kind: MessageType, mask: [u8; 4]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(encoded_len(payload.len(), true));
    put_header(&mut buf, kind, payload.len(), true);
    buf.put_slice(&mask);
    let start = buf.len();
    buf.put_slice(payload);
    apply_mask_fast(&mut buf[start..], mask);
    buf
}
