//! Test harness shared by the integration tests.
//!
//! Provides a TCP echo server built on [`wirews::accept`], a raw client that
//! speaks the client side of the protocol, and one-time log setup.

#![allow(dead_code)]

mod client;
mod server;

use std::sync::Once;

use tracing_subscriber::EnvFilter;

pub use client::TestClient;
pub use server::TestServer;

static INIT_LOGGING: Once = Once::new();

/// Install a `tracing` subscriber writing through the test harness.
///
/// Honors `RUST_LOG`; defaults to `wirews=trace`. Safe to call from every
/// test, only the first call installs the subscriber.
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("wirews=trace"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_ansi(false)
            .try_init();
    });
}

/// Upgrade request carrying the RFC 6455 sample key under `key_header`.
pub fn upgrade_request(key_header: &str) -> Vec<u8> {
    format!(
        "GET /chat HTTP/1.1\r\n\
         Host: localhost\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         {key_header}: {SAMPLE_KEY}\r\n\
         Sec-WebSocket-Version: 13\r\n\
         \r\n"
    )
    .into_bytes()
}

/// Client key from RFC 6455 section 1.3.
pub const SAMPLE_KEY: &str = "dGhlIHNhbXBsZSBub25jZQ==";

/// Expected response to [`upgrade_request`].
pub const SAMPLE_RESPONSE: &[u8] = b"HTTP/1.1 101 Switching Protocols\r\n\
Upgrade: websocket\r\n\
Connection: Upgrade\r\n\
Sec-WebSocket-Accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=\r\n\
\r\n";
