//! Inbound proxy integration event.
//!
//! A typical event looks like:
//!
//! ```json
//! {
//!   "resource": "/{proxy+}",
//!   "path": "/orders/42",
//!   "httpMethod": "GET",
//!   "headers": { "Accept": "application/json" },
//!   "queryStringParameters": { "expand": "items" },
//!   "pathParameters": { "proxy": "orders/42" },
//!   "requestContext": {
//!     "apiId": "x1y2z3",
//!     "stage": "prod",
//!     "identity": { "sourceIp": "203.0.113.7" }
//!   },
//!   "body": null,
//!   "isBase64Encoded": false
//! }
//! ```

use serde::{Deserialize, Deserializer, Serialize};

use crate::params::ParameterMap;

/// Path parameter key holding the suffix matched by a greedy `{proxy+}` resource.
pub const PROXY_PATH_PARAMETER: &str = "proxy";

/// Proxy integration request event.
///
/// Missing or `null` fields deserialize to empty defaults, so a sparse event
/// from a test harness is accepted as well as a full gateway event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProxyRequest {
    /// Resource path template, e.g. `/{proxy+}`.
    #[serde(deserialize_with = "null_as_default")]
    pub resource: String,
    /// Concrete request path as seen by the gateway.
    #[serde(deserialize_with = "null_as_default")]
    pub path: String,
    /// HTTP method.
    #[serde(deserialize_with = "null_as_default")]
    pub http_method: String,
    /// Request headers.
    pub headers: Option<ParameterMap>,
    /// Query-string parameters, values not decoded.
    pub query_string_parameters: Option<ParameterMap>,
    /// Path parameters matched against the resource template.
    pub path_parameters: Option<ParameterMap>,
    /// Stage variables configured on the deployment stage.
    pub stage_variables: Option<ParameterMap>,
    /// Gateway request context.
    pub request_context: Option<ProxyRequestContext>,
    /// Raw request body.
    pub body: Option<String>,
    /// Whether `body` is Base64 encoded.
    #[serde(deserialize_with = "null_as_default")]
    pub is_base64_encoded: bool,
}

impl ProxyRequest {
    /// API identifier from the request context, if any.
    #[must_use]
    pub fn api_id(&self) -> Option<&str> {
        self.request_context.as_ref()?.api_id.as_deref()
    }

    /// Deployment stage from the request context, if any.
    #[must_use]
    pub fn stage(&self) -> Option<&str> {
        self.request_context.as_ref()?.stage.as_deref()
    }

    /// Caller source IP from the request context identity, if any.
    #[must_use]
    pub fn source_ip(&self) -> Option<&str> {
        self.request_context
            .as_ref()?
            .identity
            .as_ref()?
            .source_ip
            .as_deref()
    }

    /// Gateway request id from the request context, if any.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.request_context.as_ref()?.request_id.as_deref()
    }
}

/// Request context attached by the gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProxyRequestContext {
    /// Account owning the API.
    pub account_id: Option<String>,
    /// API identifier.
    pub api_id: Option<String>,
    /// Deployment stage.
    pub stage: Option<String>,
    /// Gateway request id.
    pub request_id: Option<String>,
    /// Resource path template that matched.
    pub resource_path: Option<String>,
    /// HTTP method as seen by the gateway.
    pub http_method: Option<String>,
    /// Caller identity.
    pub identity: Option<ProxyIdentity>,
}

/// Caller identity within the request context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProxyIdentity {
    /// Caller source IP address.
    pub source_ip: Option<String>,
    /// Caller user agent.
    pub user_agent: Option<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
