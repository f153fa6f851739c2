//! Opening handshake: key exchange and the `101 Switching Protocols` response.

use std::collections::{BTreeMap, HashMap};

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use sha1::{Digest, Sha1};

use crate::error::{Error, Result};

/// The GUID appended to the client key before hashing.
pub const WS_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Canonical spelling of the client key header.
pub const SEC_WEBSOCKET_KEY: &str = "Sec-WebSocket-Key";

/// Lower-case spelling of the client key header.
pub const SEC_WEBSOCKET_KEY_LOWER: &str = "sec-websocket-key";

/// Header access on a parsed HTTP request.
///
/// Lookups are by exact key; implementations are not required to normalize
/// header-name casing.
pub trait HeaderLookup {
    /// Value of header `name`, if present under exactly that spelling.
    fn header(&self, name: &str) -> Option<&str>;
}

impl<T: HeaderLookup + ?Sized> HeaderLookup for &T {
    fn header(&self, name: &str) -> Option<&str> {
        (**self).header(name)
    }
}

impl HeaderLookup for HashMap<String, String> {
    fn header(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl HeaderLookup for BTreeMap<String, String> {
    fn header(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

/// Computes the Sec-WebSocket-Accept value from the client's Sec-WebSocket-Key.
///
/// The accept key is calculated as: Base64(SHA-1(key + GUID))
///
/// # Example
///
/// ```
/// use wirews::protocol::handshake::derive_accept_key;
///
/// let key = "dGhlIHNhbXBsZSBub25jZQ==";
/// assert_eq!(derive_accept_key(key), "s3pPLMBiTxaQ9kYGzzhZRbK+xOo=");
/// ```
#[must_use]
pub fn derive_accept_key(client_key: &str) -> String {
    derive_accept_key_bytes(client_key.as_bytes())
}

/// [`derive_accept_key`] over raw bytes, for keys that are not valid UTF-8.
#[must_use]
pub fn derive_accept_key_bytes(client_key: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(client_key);
    hasher.update(WS_GUID.as_bytes());
    BASE64.encode(hasher.finalize())
}

/// Extract the client key, trying both header spellings.
///
/// The canonical spelling wins when both are present. An empty value counts
/// as missing.
///
/// # Errors
///
/// Returns `Error::HandshakeMissingKey` if neither spelling carries a value.
pub fn client_key<R: HeaderLookup + ?Sized>(request: &R) -> Result<&str> {
    request
        .header(SEC_WEBSOCKET_KEY)
        .filter(|key| !key.is_empty())
        .or_else(|| {
            request
                .header(SEC_WEBSOCKET_KEY_LOWER)
                .filter(|key| !key.is_empty())
        })
        .ok_or(Error::HandshakeMissingKey)
}

/// Build the byte-exact upgrade response carrying `accept`.
#[must_use]
pub fn build_upgrade_response(accept: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(128);
    buf.extend_from_slice(b"HTTP/1.1 101 Switching Protocols\r\n");
    buf.extend_from_slice(b"Upgrade: websocket\r\n");
    buf.extend_from_slice(b"Connection: Upgrade\r\n");
    buf.extend_from_slice(b"Sec-WebSocket-Accept: ");
    buf.extend_from_slice(accept.as_bytes());
    buf.extend_from_slice(b"\r\n\r\n");
    buf
}

/// Validate `request` and produce the response bytes to send back.
///
/// # Errors
///
/// Returns `Error::HandshakeMissingKey` if the key header is absent.
pub fn upgrade_response<R: HeaderLookup + ?Sized>(request: &R) -> Result<Vec<u8>> {
    let key = client_key(request)?;
    Ok(build_upgrade_response(&derive_accept_key(key)))
}
