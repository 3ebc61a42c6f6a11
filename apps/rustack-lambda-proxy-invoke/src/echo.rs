//! Echo pipeline used by the harness.
//!
//! Answers every request with a JSON description of what the service saw
//! after marshalling. `/status/{code}` answers with that status instead of 200.

use std::convert::Infallible;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use rustack_lambda_proxy::LambdaContext;
use rustack_lambda_proxy::model::ProxyRequest;

/// Handle one request.
pub async fn handle(
    req: http::Request<Full<Bytes>>,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();
    let body = body.collect().await?.to_bytes();

    let status = parts
        .uri
        .path()
        .strip_prefix("/status/")
        .and_then(|code| code.parse::<http::StatusCode>().ok())
        .unwrap_or(http::StatusCode::OK);

    let mut headers = serde_json::Map::new();
    for (name, value) in &parts.headers {
        headers.insert(
            name.as_str().to_owned(),
            String::from_utf8_lossy(value.as_bytes()).into_owned().into(),
        );
    }

    let mut payload = serde_json::json!({
        "method": parts.method.as_str(),
        "path": parts.uri.path(),
        "query": parts.uri.query(),
        "headers": headers,
    });
    match std::str::from_utf8(&body) {
        Ok(_) if body.is_empty() => {}
        Ok(text) => payload["body"] = text.into(),
        Err(_) => payload["bodyBase64"] = BASE64.encode(&body).into(),
    }
    if let Some(lambda) = parts.extensions.get::<LambdaContext>() {
        payload["requestId"] = lambda.request_id.clone().into();
        payload["functionName"] = lambda.function_name.clone().into();
    }
    if let Some(event) = parts.extensions.get::<Arc<ProxyRequest>>() {
        payload["resource"] = event.resource.clone().into();
        payload["stage"] = event.stage().into();
    }

    let response = http::Response::builder()
        .status(status)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(payload.to_string())))
        .unwrap_or_default();
    Ok(response)
}
