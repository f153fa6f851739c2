//! Minimal HTTP/1.1 request parsing for the upgrade request.
//!
//! Header names are stored exactly as received. Lookups through
//! [`HeaderLookup`] are therefore case-sensitive, which is why the handshake
//! probes more than one spelling of the key header.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::protocol::HeaderLookup;

/// A parsed HTTP request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpRequest {
    /// Request method, upper-cased (e.g. `GET`).
    pub method: String,
    /// Request path without the query string.
    pub path: String,
    /// Protocol version token (e.g. `HTTP/1.1`).
    pub version: String,
    /// Header values keyed by the header name as received.
    pub headers: HashMap<String, String>,
    /// Query string arguments. A key without `=` maps to an empty string.
    pub args: HashMap<String, String>,
    /// Pairs from the `Cookie` header. A pair without `=` maps to an empty string.
    pub cookies: HashMap<String, String>,
    /// Text following the blank line, if any.
    pub body: String,
}

impl HttpRequest {
    /// Parse a request from raw bytes.
    ///
    /// Bytes that are not valid UTF-8 are replaced rather than rejected, so a
    /// stray Latin-1 header value does not prevent an upgrade. Trailing NUL
    /// padding (as left by a fixed-size read buffer) is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] if the request is empty or the
    /// request line does not have exactly three parts.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let text = String::from_utf8_lossy(data);
        let text = text.trim_end_matches('\0');

        let (head, body) = match text.split_once("\r\n\r\n") {
            Some((head, body)) => (head, body),
            None => (text.trim_end_matches("\r\n"), ""),
        };
        let mut lines = head.split("\r\n");

        // Parse request line: "GET /path?query HTTP/1.1"
        let request_line = lines
            .next()
            .filter(|line| !line.is_empty())
            .ok_or_else(|| Error::InvalidRequest("Empty request".into()))?;
        let parts: Vec<&str> = request_line.split_whitespace().collect();
        let [method, target, version] = parts.as_slice() else {
            return Err(Error::InvalidRequest(format!(
                "Invalid request line: {}",
                request_line
            )));
        };

        let mut headers = HashMap::new();
        for line in lines {
            if let Some((name, value)) = line.split_once(':') {
                headers.insert(name.trim().to_string(), value.trim().to_string());
            }
        }

        let cookies = headers
            .get("Cookie")
            .map(String::as_str)
            .map(parse_cookies)
            .unwrap_or_default();
        let (path, args) = parse_target(target);

        Ok(Self {
            method: method.to_uppercase(),
            path,
            version: (*version).to_string(),
            headers,
            args,
            cookies,
            body: body.to_string(),
        })
    }

    /// Value of query argument `name`.
    #[must_use]
    pub fn arg(&self, name: &str) -> Option<&str> {
        self.args.get(name).map(String::as_str)
    }

    /// Value of cookie `name`.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }
}

impl HeaderLookup for HttpRequest {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// Split a `Cookie` header value into name/value pairs.
fn parse_cookies(header: &str) -> HashMap<String, String> {
    header
        .split(';')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((name, value)) => (name.to_string(), value.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .collect()
}

/// Split a request target into its path and query arguments.
fn parse_target(target: &str) -> (String, HashMap<String, String>) {
    let Some((path, query)) = target.split_once('?') else {
        return (target.to_string(), HashMap::new());
    };

    let args = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (key.to_string(), value.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .collect();

    (path.to_string(), args)
}
