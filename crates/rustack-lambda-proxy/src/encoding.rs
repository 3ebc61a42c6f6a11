//! Content-type driven response body encoding.
//!
//! The gateway transports response bodies as JSON strings. Textual content
//! travels as-is, binary content must be Base64 encoded and flagged so the
//! gateway decodes it before answering the client. [`EncodingPolicy`] decides
//! which mode applies to a given `Content-Type`.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Transport encoding for a response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ResponseContentEncoding {
    /// Body is sent as UTF-8 text.
    #[default]
    #[serde(rename = "text")]
    Default,
    /// Body is sent Base64 encoded.
    #[serde(rename = "base64")]
    Base64,
}

impl ResponseContentEncoding {
    /// Returns the configuration name of this mode.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "text",
            Self::Base64 => "base64",
        }
    }

    /// Parse a configuration name (`text`/`default` or `base64`, any case).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        if name.eq_ignore_ascii_case("text") || name.eq_ignore_ascii_case("default") {
            Some(Self::Default)
        } else if name.eq_ignore_ascii_case("base64") {
            Some(Self::Base64)
        } else {
            None
        }
    }
}

impl fmt::Display for ResponseContentEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Content types sent as text unless overridden.
const TEXT_CONTENT_TYPES: &[&str] = &[
    "text/plain",
    "text/xml",
    "application/xml",
    "application/json",
    "text/html",
    "text/css",
    "text/javascript",
    "text/ecmascript",
    "text/markdown",
    "text/csv",
];

/// Content types sent as Base64 unless overridden.
const BINARY_CONTENT_TYPES: &[&str] = &[
    "application/octet-stream",
    "image/png",
    "image/gif",
    "image/jpeg",
    "application/zip",
    "application/pdf",
];

/// Strip media-type parameters: `application/json; charset=utf-8` becomes
/// `application/json`.
#[must_use]
pub fn bare_content_type(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
}

/// Registry mapping bare content types to a [`ResponseContentEncoding`].
///
/// Lookups are exact and case-sensitive on the registered keys. Types that are
/// not registered resolve to the default mode.
///
/// The policy is meant to be configured once, before traffic starts. It is
/// owned by the [`ResponseMarshaller`](crate::ResponseMarshaller), so mutating
/// it needs exclusive access to the marshaller.
///
/// # Examples
///
/// ```
/// use rustack_lambda_proxy::{EncodingPolicy, ResponseContentEncoding};
///
/// let mut policy = EncodingPolicy::default();
/// assert_eq!(
///     policy.resolve(Some("application/json; charset=utf-8")),
///     ResponseContentEncoding::Default,
/// );
/// assert_eq!(policy.resolve(Some("image/png")), ResponseContentEncoding::Base64);
///
/// policy.register("application/wasm", ResponseContentEncoding::Base64);
/// assert_eq!(
///     policy.resolve(Some("application/wasm")),
///     ResponseContentEncoding::Base64,
/// );
/// ```
#[derive(Debug, Clone)]
pub struct EncodingPolicy {
    rules: HashMap<String, ResponseContentEncoding>,
    default_mode: ResponseContentEncoding,
}

impl Default for EncodingPolicy {
    fn default() -> Self {
        Self::with_default_mode(ResponseContentEncoding::Default)
    }
}

impl EncodingPolicy {
    /// Create a policy seeded with the standard table and the given fallback mode.
    #[must_use]
    pub fn with_default_mode(default_mode: ResponseContentEncoding) -> Self {
        let rules = TEXT_CONTENT_TYPES
            .iter()
            .map(|ct| ((*ct).to_owned(), ResponseContentEncoding::Default))
            .chain(
                BINARY_CONTENT_TYPES
                    .iter()
                    .map(|ct| ((*ct).to_owned(), ResponseContentEncoding::Base64)),
            )
            .collect();

        Self {
            rules,
            default_mode,
        }
    }

    /// Create a policy with no registered content types.
    #[must_use]
    pub fn empty(default_mode: ResponseContentEncoding) -> Self {
        Self {
            rules: HashMap::new(),
            default_mode,
        }
    }

    /// Resolve the encoding for a `Content-Type` header value.
    ///
    /// `None` and unregistered types resolve to [`default_mode`](Self::default_mode).
    #[must_use]
    pub fn resolve(&self, content_type: Option<&str>) -> ResponseContentEncoding {
        content_type
            .map(bare_content_type)
            .and_then(|ct| self.rules.get(ct).copied())
            .unwrap_or(self.default_mode)
    }

    /// Register (or replace) the encoding for a bare content type.
    pub fn register(&mut self, content_type: impl Into<String>, mode: ResponseContentEncoding) {
        let content_type = content_type.into();
        tracing::debug!(content_type = %content_type, mode = %mode, "registering response encoding");
        self.rules.insert(content_type, mode);
    }

    /// Fallback mode for absent or unregistered content types.
    #[must_use]
    pub fn default_mode(&self) -> ResponseContentEncoding {
        self.default_mode
    }

    /// Replace the fallback mode.
    pub fn set_default_mode(&mut self, mode: ResponseContentEncoding) {
        self.default_mode = mode;
    }

    /// Number of registered content types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether no content type is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
