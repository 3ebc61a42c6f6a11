//! Proxy adapter configuration.
//!
//! Provides [`ProxyConfig`]. Values are loaded from environment variables,
//! matching how the function host passes settings to the runtime.

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::encoding::ResponseContentEncoding;

/// Proxy adapter configuration.
///
/// # Examples
///
/// ```
/// use rustack_lambda_proxy::ProxyConfig;
///
/// let config = ProxyConfig::default();
/// assert_eq!(config.default_status_code, 200);
/// assert!(!config.rethrow_errors);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct ProxyConfig {
    /// Status code used when the processor completes without setting one.
    #[builder(default = 200)]
    pub default_status_code: u16,

    /// Encoding for response bodies whose content type is absent or unknown.
    #[builder(default)]
    pub default_response_encoding: ResponseContentEncoding,

    /// Return processor failures to the caller instead of containing them.
    #[builder(default = false)]
    pub rethrow_errors: bool,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            default_status_code: 200,
            default_response_encoding: ResponseContentEncoding::Default,
            rethrow_errors: false,
            log_level: String::from("info"),
        }
    }
}

impl ProxyConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `PROXY_DEFAULT_STATUS_CODE` | `200` |
    /// | `PROXY_DEFAULT_RESPONSE_ENCODING` | `text` |
    /// | `PROXY_RETHROW_ERRORS` | `false` |
    /// | `LOG_LEVEL` | `info` |
    ///
    /// Unparsable values keep the default.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(v) = lookup("PROXY_DEFAULT_STATUS_CODE") {
            match v.trim().parse::<u16>() {
                Ok(code) if code != 0 => config.default_status_code = code,
                _ => tracing::warn!(value = %v, "ignoring invalid PROXY_DEFAULT_STATUS_CODE"),
            }
        }
        if let Some(v) = lookup("PROXY_DEFAULT_RESPONSE_ENCODING") {
            match ResponseContentEncoding::from_name(&v) {
                Some(mode) => config.default_response_encoding = mode,
                None => {
                    tracing::warn!(value = %v, "ignoring invalid PROXY_DEFAULT_RESPONSE_ENCODING");
                }
            }
        }
        if let Some(v) = lookup("PROXY_RETHROW_ERRORS") {
            config.rethrow_errors = parse_bool(&v);
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            config.log_level = v;
        }

        config
    }
}

/// Parse a string as a boolean, accepting `"1"` and `"true"` (case-insensitive).
fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}
