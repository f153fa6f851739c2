//! Server-side session: the opening handshake and message I/O on one
//! connection.
//!
//! ## Session Lifecycle
//!
//! 1. **Handshaking** - Upgrade request received, `101` response being written
//! 2. **Open** - Messages flow both ways
//! 3. **Closing** - A read/write failed or the peer sent CLOSE
//! 4. **Closed** - Close frame sent and stream shut down
//!
//! ## Example
//!
//! ```rust,ignore
//! use wirews::{Config, upgrade_from_buffer};
//!
//! let mut session = upgrade_from_buffer(stream, &request_bytes, Config::default()).await?;
//! session.send("hello").await?;
//! let reply = session.receive().await?;
//! session.close("done", 1000).await?;
//! ```

mod state;

pub use state::SessionState;

#[cfg(feature = "async-tokio")]
#[allow(clippy::module_inception)]
mod session;

#[cfg(feature = "async-tokio")]
mod upgrade;

#[cfg(feature = "async-tokio")]
pub use session::Session;

#[cfg(feature = "async-tokio")]
pub use upgrade::{accept, handshake, upgrade, upgrade_from_buffer};
