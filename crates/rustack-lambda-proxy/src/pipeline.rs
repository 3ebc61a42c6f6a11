//! Runs a hyper [`Service`] as the request-processing pipeline.
//!
//! [`ServiceProcessor`] rebuilds an `http::Request` from the request
//! features, calls the service and copies the response back into the
//! response features. The [`LambdaContext`] and the original
//! [`ProxyRequest`] are available to the service as request extensions.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http_body_util::{BodyExt, Full};
use hyper::service::Service;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use rustack_lambda_proxy_model::ProxyRequest;

use crate::context::{InvocationContext, LambdaContext};
use crate::dispatch::ProxyProcessor;
use crate::error::{BoxError, ProcessorError, short_type_name};
use crate::features::HttpRequestFeatures;

/// Characters re-encoded when the decoded path is put back into a URI.
const PATH_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Adapts a hyper `Service` into a [`ProxyProcessor`].
///
/// # Examples
///
/// ```
/// use std::convert::Infallible;
///
/// use bytes::Bytes;
/// use http_body_util::Full;
/// use hyper::service::service_fn;
/// use rustack_lambda_proxy::{InvocationDispatcher, ProxyConfig, ServiceProcessor};
///
/// let service = service_fn(|_req: http::Request<Full<Bytes>>| async {
///     Ok::<_, Infallible>(http::Response::new(Full::new(Bytes::from_static(b"pong"))))
/// });
/// let dispatcher = InvocationDispatcher::new(ServiceProcessor::new(service), &ProxyConfig::default());
/// # let _ = dispatcher;
/// ```
#[derive(Debug, Clone)]
pub struct ServiceProcessor<S> {
    service: S,
}

impl<S> ServiceProcessor<S> {
    /// Wrap a service.
    #[must_use]
    pub fn new(service: S) -> Self {
        Self { service }
    }

    /// The wrapped service.
    #[must_use]
    pub fn service(&self) -> &S {
        &self.service
    }

    /// Unwrap the service.
    #[must_use]
    pub fn into_inner(self) -> S {
        self.service
    }
}

#[async_trait]
impl<S, B> ProxyProcessor for ServiceProcessor<S>
where
    S: Service<http::Request<Full<Bytes>>, Response = http::Response<B>> + Send + Sync + 'static,
    S::Future: Send,
    S::Error: Into<BoxError>,
    B: http_body::Body + Send + 'static,
    B::Data: Send,
    B::Error: Into<BoxError>,
{
    async fn process(&self, context: &mut InvocationContext) -> Result<(), ProcessorError> {
        let request = build_request(
            &context.request,
            context.lambda_context().clone(),
            Arc::clone(context.event()),
        )?;

        let response = self
            .service
            .call(request)
            .await
            .map_err(|e| ProcessorError::from_boxed(short_type_name::<S::Error>(), e.into()))?;

        let (parts, body) = response.into_parts();
        let body = body
            .collect()
            .await
            .map_err(|e| ProcessorError::from_boxed(short_type_name::<B::Error>(), e.into()))?
            .to_bytes();

        let features = &mut context.response;
        features.status_code = parts.status.as_u16();
        for (name, value) in &parts.headers {
            features
                .headers
                .append(name.as_str(), String::from_utf8_lossy(value.as_bytes()));
        }
        if !body.is_empty() {
            features.write_body(&body);
        }

        Ok(())
    }
}

/// Build an origin-form `http::Request` from request features.
fn build_request(
    features: &HttpRequestFeatures,
    lambda: LambdaContext,
    event: Arc<ProxyRequest>,
) -> Result<http::Request<Full<Bytes>>, ProcessorError> {
    let method = if features.method.is_empty() {
        http::Method::GET
    } else {
        http::Method::from_bytes(features.method.as_bytes())
            .map_err(ProcessorError::unclassified)?
    };

    let uri = format!(
        "{}{}",
        utf8_percent_encode(&features.path, PATH_ENCODE_SET),
        features.query_string,
    );
    let uri: http::Uri = uri.parse().map_err(ProcessorError::unclassified)?;

    let mut request = http::Request::new(Full::new(features.body_bytes()));
    *request.method_mut() = method;
    *request.uri_mut() = uri;

    let headers = request.headers_mut();
    for (name, values) in features.headers.iter() {
        let Ok(header_name) = HeaderName::from_bytes(name.as_bytes()) else {
            tracing::warn!(header = name, "skipping request header with invalid name");
            continue;
        };
        for value in values {
            match HeaderValue::from_str(value) {
                Ok(value) => {
                    headers.append(header_name.clone(), value);
                }
                Err(_) => {
                    tracing::warn!(header = name, "skipping request header with invalid value");
                }
            }
        }
    }

    let extensions = request.extensions_mut();
    extensions.insert(lambda);
    extensions.insert(event);

    Ok(request)
}
