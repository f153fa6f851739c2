//! Frame-level encoding/decoding over async streams.

#[cfg(feature = "async-tokio")]
mod framed;

#[cfg(all(test, feature = "async-tokio"))]
pub(crate) mod mock;

#[cfg(feature = "async-tokio")]
pub use framed::WebSocketCodec;
