//! # wirews - Minimal server-side WebSocket layer
//!
//! `wirews` upgrades an HTTP/1.1 connection to the WebSocket protocol
//! (RFC 6455) and exchanges single-frame messages over it.
//!
//! ## Features
//!
//! - **Key exchange** producing the byte-exact `101 Switching Protocols` response
//! - **Frame codec** for 7, 16 and 64-bit payload lengths, masked or not
//! - **Partial reads** reassembled by an explicit accumulator state machine
//! - **Bounded buffers** via [`Config::max_message_size`] and [`Config::max_handshake_size`]
//! - **Runtime-agnostic core**, with a tokio session layer behind `async-tokio`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use wirews::{Config, accept};
//!
//! let (stream, _) = listener.accept().await?;
//! let (mut session, request) = accept(stream, Config::default()).await?;
//!
//! let payload = session.receive().await?;
//! session.send_bytes(&payload).await?;
//! session.close("bye", 1000).await?;
//! ```
//!
//! The pure codec works without a runtime:
//!
//! ```
//! use wirews::protocol::{decode, encode, MessageType};
//!
//! let wire = encode(b"hi", MessageType::Text);
//! let frame = decode(&wire).unwrap();
//! assert_eq!(frame.payload(), b"hi");
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod message;
pub mod protocol;
pub mod session;

#[cfg(feature = "async-tokio")]
pub mod codec;

pub use config::Config;
pub use error::{Error, Result, Truncation};
pub use http::HttpRequest;
pub use message::{CloseCode, CloseFrame};
pub use protocol::{
    Frame, HeaderLookup, MessageType, OpCode, WS_GUID, decode, derive_accept_key, encode,
};
pub use session::SessionState;

#[cfg(feature = "async-tokio")]
pub use codec::WebSocketCodec;
#[cfg(feature = "async-tokio")]
pub use session::{Session, accept, handshake, upgrade, upgrade_from_buffer};
