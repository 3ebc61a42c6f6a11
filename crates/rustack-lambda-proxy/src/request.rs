//! Proxy event to HTTP request features.
//!
//! The gateway describes a call as a flat JSON document. Before a processor can
//! see it, the document is folded back into request features:
//!
//! ```text
//! resource "/{proxy+}" + pathParameters.proxy "a/b"   ->  path  "/a/b"
//! queryStringParameters {"q": "a b", "n": "1"}         ->  query "?q=a%20b&n=1"
//! requestContext {apiId: "x1", stage: "prod"}          ->  Host  "apigateway-x1-prod"
//! ```

use std::io::Cursor;
use std::net::IpAddr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

use rustack_lambda_proxy_model::ParameterMap;
use rustack_lambda_proxy_model::ProxyRequest;
use rustack_lambda_proxy_model::request::PROXY_PATH_PARAMETER;

use crate::error::RequestError;
use crate::features::HttpRequestFeatures;

/// Scheme of every request arriving through the gateway.
pub const SCHEME: &str = "https";

/// Placeholder for the greedy path parameter in a resource template.
pub const PROXY_PLACEHOLDER: &str = "{proxy+}";

/// Host header name.
pub const HOST_HEADER: &str = "Host";

/// Header carrying the port the client connected to.
pub const FORWARDED_PORT_HEADER: &str = "X-Forwarded-Port";

/// Characters left unencoded in query keys and values: RFC 3986 unreserved.
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Builds [`HttpRequestFeatures`] from a [`ProxyRequest`].
///
/// Malformed optional input (an unparsable source IP, missing identifiers) is
/// tolerated with defaults. Only an invalid `X-Forwarded-Port` or an
/// undecodable Base64 body fail.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestMarshaller;

impl RequestMarshaller {
    /// Create a new marshaller.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Fill `features` from `event`.
    pub fn marshal(
        &self,
        features: &mut HttpRequestFeatures,
        event: &ProxyRequest,
    ) -> Result<(), RequestError> {
        features.scheme = SCHEME.to_owned();
        features.method.clone_from(&event.http_method);
        features.path = resolve_path(event);
        features.query_string = event
            .query_string_parameters
            .as_ref()
            .map(build_query_string)
            .unwrap_or_default();

        if let Some(headers) = &event.headers {
            for (name, value) in headers.iter() {
                features.headers.insert(name, value);
            }
        }
        if !features.headers.contains(HOST_HEADER) {
            features.headers.insert(HOST_HEADER, synthesized_host(event));
        }

        features.body = decode_body(event)?.map(Cursor::new);

        features.remote_addr = event
            .source_ip()
            .and_then(|ip| ip.trim().parse::<IpAddr>().ok());

        if let Some(port) = features.headers.get_first(FORWARDED_PORT_HEADER) {
            let parsed = port
                .trim()
                .parse::<u16>()
                .map_err(|source| RequestError::InvalidForwardedPort {
                    value: port.to_owned(),
                    source,
                })?;
            features.remote_port = Some(parsed);
        }

        tracing::debug!(
            method = %features.method,
            path = %features.path,
            query = %features.query_string,
            body_len = features.body.as_ref().map_or(0, |b| b.get_ref().len()),
            "marshalled proxy request",
        );

        Ok(())
    }
}

/// Resolve the decoded request path.
///
/// A `proxy` path parameter is substituted into the resource template;
/// otherwise the concrete path is used.
fn resolve_path(event: &ProxyRequest) -> String {
    let proxy = event
        .path_parameters
        .as_ref()
        .and_then(|params| params.get(PROXY_PATH_PARAMETER));

    let raw = match proxy {
        Some(value) => event.resource.replace(PROXY_PLACEHOLDER, value),
        None => event.path.clone(),
    };

    let raw = if raw.starts_with('/') {
        raw
    } else {
        format!("/{raw}")
    };

    percent_decode_str(&raw).decode_utf8_lossy().into_owned()
}

/// Rebuild the query string in the order the gateway sent the parameters.
fn build_query_string(params: &ParameterMap) -> String {
    let mut query = String::new();
    for (key, value) in params.iter() {
        query.push(if query.is_empty() { '?' } else { '&' });
        query.extend(utf8_percent_encode(key, QUERY_ENCODE_SET));
        query.push('=');
        query.extend(utf8_percent_encode(value, QUERY_ENCODE_SET));
    }
    query
}

fn synthesized_host(event: &ProxyRequest) -> String {
    format!(
        "apigateway-{}-{}",
        event.api_id().unwrap_or_default(),
        event.stage().unwrap_or_default(),
    )
}

fn decode_body(event: &ProxyRequest) -> Result<Option<Bytes>, RequestError> {
    let Some(body) = event.body.as_deref().filter(|b| !b.is_empty()) else {
        return Ok(None);
    };

    let bytes = if event.is_base64_encoded {
        Bytes::from(BASE64.decode(body)?)
    } else {
        Bytes::copy_from_slice(body.as_bytes())
    };
    Ok(Some(bytes))
}
