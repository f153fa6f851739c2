//! WebSocket framing and handshake core.
//!
//! Everything in this module is synchronous and runtime-agnostic; the async
//! session layer builds on top of it.

pub mod accumulator;
pub mod frame;
pub mod handshake;
pub mod mask;
pub mod opcode;

pub use accumulator::{AccumulatorState, FrameAccumulator};
pub use frame::{Frame, decode, encode, encode_into, encode_masked, encoded_len};
pub use handshake::{
    HeaderLookup, WS_GUID, build_upgrade_response, client_key, derive_accept_key,
    upgrade_response,
};
pub use mask::{apply_mask, apply_mask_fast, random_mask_key};
pub use opcode::{MessageType, OpCode};
