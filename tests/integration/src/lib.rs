//! End-to-end tests for the proxy adapter.
//!
//! Events go through the public dispatch entry points and a real hyper
//! `Service`, the same way the function runtime drives the adapter.
//!
//! ```text
//! cargo test -p rustack-lambda-proxy-integration
//! ```

use std::convert::Infallible;
use std::sync::Once;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use rustack_lambda_proxy::model::ProxyRequest;
use rustack_lambda_proxy::{LambdaContext, ProxyConfig};

static INIT: Once = Once::new();

/// 1x1 transparent PNG.
pub const PIXEL_PNG: &[u8] = &[
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1f,
    0x15, 0xc4, 0x89, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9c, 0x63, 0xf8,
    0xff, 0xff, 0x3f, 0x00, 0x05, 0xfe, 0x02, 0xfe, 0xa7, 0x35, 0x81, 0x84, 0x00, 0x00, 0x00,
    0x00, 0x49, 0x45, 0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
];

/// Initialize tracing (once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Host context for a test invocation.
#[must_use]
pub fn lambda_context() -> LambdaContext {
    init_tracing();
    LambdaContext::local("integration")
}

/// Config with rethrow mode toggled.
#[must_use]
pub fn config(rethrow_errors: bool) -> ProxyConfig {
    ProxyConfig::builder().rethrow_errors(rethrow_errors).build()
}

/// A gateway event as sent for `GET /{proxy+}` on stage `prod`.
#[must_use]
pub fn gateway_event(method: &str, proxy: &str) -> serde_json::Value {
    serde_json::json!({
        "resource": "/{proxy+}",
        "path": format!("/{proxy}"),
        "httpMethod": method,
        "headers": {
            "Accept": "*/*",
            "User-Agent": "curl/8.5.0",
            "X-Forwarded-Port": "443",
            "X-Forwarded-Proto": "https"
        },
        "queryStringParameters": null,
        "pathParameters": { "proxy": proxy },
        "stageVariables": null,
        "requestContext": {
            "accountId": "123456789012",
            "apiId": "r7x1bq",
            "stage": "prod",
            "requestId": "c6af9ac6-7b61-11e6-9a41-93e8deadbeef",
            "resourcePath": "/{proxy+}",
            "httpMethod": method,
            "identity": {
                "sourceIp": "203.0.113.7",
                "userAgent": "curl/8.5.0"
            }
        },
        "body": null,
        "isBase64Encoded": false
    })
}

/// Echo the request back as JSON.
pub async fn echo(
    req: http::Request<Full<Bytes>>,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();
    let body = body.collect().await?.to_bytes();

    let headers: serde_json::Map<String, serde_json::Value> = parts
        .headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_owned(),
                serde_json::Value::from(value.to_str().unwrap_or_default()),
            )
        })
        .collect();

    let payload = serde_json::json!({
        "method": parts.method.as_str(),
        "path": parts.uri.path(),
        "query": parts.uri.query(),
        "headers": headers,
        "body": String::from_utf8_lossy(&body),
        "requestId": parts.extensions.get::<LambdaContext>().map(|c| c.request_id.clone()),
        "stage": parts
            .extensions
            .get::<std::sync::Arc<ProxyRequest>>()
            .and_then(|event| event.stage().map(str::to_owned)),
    });

    let response = http::Response::builder()
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(payload.to_string())))
        .unwrap_or_default();
    Ok(response)
}

/// Serve [`PIXEL_PNG`] for `/pixel.png`, 404 text otherwise.
pub async fn assets(
    req: http::Request<Full<Bytes>>,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let response = if req.uri().path() == "/pixel.png" {
        http::Response::builder()
            .header("Content-Type", "image/png")
            .header("Cache-Control", "max-age=60")
            .body(Full::new(Bytes::from_static(PIXEL_PNG)))
    } else {
        http::Response::builder()
            .status(http::StatusCode::NOT_FOUND)
            .header("Content-Type", "text/plain; charset=utf-8")
            .body(Full::new(Bytes::from_static(b"not found")))
    };
    Ok(response.unwrap_or_default())
}

mod test_dispatch;
mod test_encoding;
mod test_failure;
