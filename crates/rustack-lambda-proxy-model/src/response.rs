//! Proxy integration response document.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Response returned to the gateway.
///
/// Multi-valued headers are pre-joined into a single comma-separated value.
/// When `is_base64_encoded` is set, `body` holds Base64 text and the gateway
/// decodes it before answering the client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResponse {
    /// HTTP status code.
    pub status_code: u16,
    /// Response headers, one value per name.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Response body, absent when the response carried none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Whether `body` is Base64 encoded.
    #[serde(default)]
    pub is_base64_encoded: bool,
}

impl ProxyResponse {
    /// Look up a header by ASCII case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
