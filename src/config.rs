//! Per-session configuration.

use crate::error::{Error, Result};

/// Default upper bound on a single received message, in bytes.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 1024;

/// Default upper bound on the HTTP upgrade request, in bytes.
pub const DEFAULT_MAX_HANDSHAKE_SIZE: usize = 1024;

/// WebSocket session configuration.
///
/// Each [`Session`](crate::Session) owns its own copy; there is no shared
/// process-wide default to mutate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Config {
    /// Maximum payload size of a received frame.
    ///
    /// Also the capacity of each read from the underlying stream.
    ///
    /// Default: 1024
    pub max_message_size: usize,

    /// Maximum size of the HTTP upgrade request.
    ///
    /// Default: 1024
    pub max_handshake_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            max_handshake_size: DEFAULT_MAX_HANDSHAKE_SIZE,
        }
    }
}

impl Config {
    /// Create a configuration with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum received message size.
    #[must_use]
    pub const fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Set the maximum upgrade request size.
    #[must_use]
    pub const fn with_max_handshake_size(mut self, size: usize) -> Self {
        self.max_handshake_size = size;
        self
    }

    /// Validate that a declared payload length is within limits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MessageTooLarge`] if `size` exceeds `max_message_size`.
    pub const fn check_message_size(&self, size: u64) -> Result<()> {
        if size > self.max_message_size as u64 {
            Err(Error::MessageTooLarge {
                size,
                max: self.max_message_size,
            })
        } else {
            Ok(())
        }
    }

    /// Validate that an upgrade request is within limits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HandshakeTooLarge`] if `size` exceeds `max_handshake_size`.
    pub const fn check_handshake_size(&self, size: usize) -> Result<()> {
        if size > self.max_handshake_size {
            Err(Error::HandshakeTooLarge {
                size,
                max: self.max_handshake_size,
            })
        } else {
            Ok(())
        }
    }
}
