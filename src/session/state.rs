//! Session lifecycle.

/// Lifecycle state of a [`Session`](crate::Session).
///
/// `Handshaking → Open → Closing → Closed`. A session only becomes `Open`
/// after a successful upgrade; an error while `Open` moves it to `Closing`,
/// and `close` always ends in `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum SessionState {
    /// Upgrade request received, response not yet written.
    #[default]
    Handshaking,
    /// Handshake complete, messages flow both ways.
    Open,
    /// A read/write failed or the peer sent CLOSE; the caller should close.
    Closing,
    /// Close frame sent and stream shut down.
    Closed,
}

impl SessionState {
    /// Returns `true` unless the session is `Closed`.
    #[must_use]
    #[inline]
    pub const fn is_active(&self) -> bool {
        !matches!(self, SessionState::Closed)
    }

    /// Sending and receiving are only allowed while `Open`.
    #[must_use]
    #[inline]
    pub const fn is_open(&self) -> bool {
        matches!(self, SessionState::Open)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Handshaking => write!(f, "Handshaking"),
            SessionState::Open => write!(f, "Open"),
            SessionState::Closing => write!(f, "Closing"),
            SessionState::Closed => write!(f, "Closed"),
        }
    }
}
