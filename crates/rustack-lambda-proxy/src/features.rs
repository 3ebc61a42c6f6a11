//! Generic HTTP request and response features.
//!
//! These are the representations handed to and read back from the processor.
//! They deliberately avoid `http::HeaderMap`: gateway header names arrive in
//! arbitrary case and are not guaranteed to be valid HTTP tokens, and both
//! must survive the round trip untouched.

use std::io::{self, Cursor};
use std::net::IpAddr;

use bytes::{Bytes, BytesMut};

/// Multi-valued header collection with ASCII case-insensitive names.
///
/// Names keep the case of their first insertion; entries keep insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderDictionary {
    entries: Vec<(String, Vec<String>)>,
}

impl HeaderDictionary {
    /// Create an empty dictionary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(name))
    }

    /// Set a header to a single value, replacing any existing values.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(idx) => self.entries[idx].1 = vec![value],
            None => self.entries.push((name, vec![value])),
        }
    }

    /// Append a value to a header, creating it if needed.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(idx) => self.entries[idx].1.push(value),
            None => self.entries.push((name, vec![value])),
        }
    }

    /// All values of a header.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.position(name).map(|idx| self.entries[idx].1.as_slice())
    }

    /// First value of a header.
    #[must_use]
    pub fn get_first(&self, name: &str) -> Option<&str> {
        self.get(name)?.first().map(String::as_str)
    }

    /// Whether the header is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Remove a header, returning its values.
    pub fn remove(&mut self, name: &str) -> Option<Vec<String>> {
        self.position(name).map(|idx| self.entries.remove(idx).1)
    }

    /// Iterate over `(name, values)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of distinct header names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no header is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Request representation consumed by the processor.
#[derive(Debug, Clone, Default)]
pub struct HttpRequestFeatures {
    /// URI scheme, always `https` for gateway traffic.
    pub scheme: String,
    /// HTTP method.
    pub method: String,
    /// Decoded request path, always starting with `/`.
    pub path: String,
    /// Encoded query string including the leading `?`, or empty.
    pub query_string: String,
    /// Request headers.
    pub headers: HeaderDictionary,
    /// Request body positioned at its start, `None` for an empty body.
    pub body: Option<Cursor<Bytes>>,
    /// Caller address, when the gateway supplied a valid one.
    pub remote_addr: Option<IpAddr>,
    /// Caller port from `X-Forwarded-Port`.
    pub remote_port: Option<u16>,
}

impl HttpRequestFeatures {
    /// The full body, independent of the cursor position.
    #[must_use]
    pub fn body_bytes(&self) -> Bytes {
        self.body
            .as_ref()
            .map(|cursor| cursor.get_ref().clone())
            .unwrap_or_default()
    }
}

/// Response representation filled in by the processor.
///
/// The body is append-only while the processor runs and is consumed once by
/// the [`ResponseMarshaller`](crate::ResponseMarshaller).
#[derive(Debug, Clone, Default)]
pub struct HttpResponseFeatures {
    /// Status code, `0` while unset.
    pub status_code: u16,
    /// Response headers.
    pub headers: HeaderDictionary,
    body: Option<BytesMut>,
}

impl HttpResponseFeatures {
    /// Append bytes to the body, creating it on first write.
    pub fn write_body(&mut self, data: &[u8]) {
        self.body.get_or_insert_with(BytesMut::new).extend_from_slice(data);
    }

    /// Whether a body has been written.
    #[must_use]
    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// Body written so far.
    #[must_use]
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Take the body out, leaving none behind.
    pub fn take_body(&mut self) -> Option<Bytes> {
        self.body.take().map(BytesMut::freeze)
    }
}

impl io::Write for HttpResponseFeatures {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_body(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
