//! Processor trait and invocation dispatch.
//!
//! One call to [`InvocationDispatcher::dispatch`] goes through:
//!
//! ```text
//! Building ──► Processing ──► Succeeded | Faulted ──► Finalizing ──► Done
//! ```
//!
//! Processor failures, panics included, are contained and turned into a 500
//! response carrying an `ErrorType` header. The context is torn down exactly
//! once on every path.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;

use rustack_lambda_proxy_model::{ProxyRequest, ProxyResponse};

use crate::config::ProxyConfig;
use crate::context::{ContextGuard, InvocationContext, LambdaContext};
use crate::encoding::EncodingPolicy;
use crate::error::{DispatchError, ProcessorError};
use crate::features::HttpRequestFeatures;
use crate::outcome::InvocationOutcome;
use crate::request::RequestMarshaller;
use crate::response::ResponseMarshaller;

/// Response header carrying the failure classification.
pub const ERROR_TYPE_HEADER: &str = "ErrorType";

/// Status code of a response for a failed invocation, unless the processor set one.
pub const FAILURE_STATUS_CODE: u16 = 500;

/// The request-processing pipeline invoked for each event.
///
/// Implementations read `context.request`, fill in `context.response` and
/// may register teardown hooks for resources they open.
#[async_trait]
pub trait ProxyProcessor: Send + Sync + 'static {
    /// Process one request.
    async fn process(&self, context: &mut InvocationContext) -> Result<(), ProcessorError>;
}

#[async_trait]
impl<P: ProxyProcessor + ?Sized> ProxyProcessor for Arc<P> {
    async fn process(&self, context: &mut InvocationContext) -> Result<(), ProcessorError> {
        (**self).process(context).await
    }
}

#[async_trait]
impl<P: ProxyProcessor + ?Sized> ProxyProcessor for Box<P> {
    async fn process(&self, context: &mut InvocationContext) -> Result<(), ProcessorError> {
        (**self).process(context).await
    }
}

/// Drives a [`ProxyProcessor`] for proxy events.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use rustack_lambda_proxy::model::ProxyRequest;
/// use rustack_lambda_proxy::{
///     InvocationContext, InvocationDispatcher, LambdaContext, ProcessorError, ProxyConfig,
///     ProxyProcessor,
/// };
///
/// struct Hello;
///
/// #[async_trait]
/// impl ProxyProcessor for Hello {
///     async fn process(&self, ctx: &mut InvocationContext) -> Result<(), ProcessorError> {
///         ctx.response.headers.insert("Content-Type", "text/plain");
///         ctx.response.write_body(b"hello");
///         Ok(())
///     }
/// }
///
/// # tokio_test::block_on(async {
/// let dispatcher = InvocationDispatcher::new(Hello, &ProxyConfig::default());
/// let response = dispatcher
///     .dispatch(ProxyRequest::default(), LambdaContext::local("hello"))
///     .await
///     .unwrap();
/// assert_eq!(response.status_code, 200);
/// assert_eq!(response.body.as_deref(), Some("hello"));
/// # });
/// ```
#[derive(Debug)]
pub struct InvocationDispatcher<P> {
    processor: P,
    request_marshaller: RequestMarshaller,
    response_marshaller: ResponseMarshaller,
    default_status_code: u16,
    rethrow_errors: bool,
}

impl<P: ProxyProcessor> InvocationDispatcher<P> {
    /// Create a dispatcher with the standard encoding table.
    #[must_use]
    pub fn new(processor: P, config: &ProxyConfig) -> Self {
        Self::with_encoding(
            processor,
            config,
            EncodingPolicy::with_default_mode(config.default_response_encoding),
        )
    }

    /// Create a dispatcher with a caller-supplied encoding policy.
    #[must_use]
    pub fn with_encoding(processor: P, config: &ProxyConfig, encoding: EncodingPolicy) -> Self {
        Self {
            processor,
            request_marshaller: RequestMarshaller::new(),
            response_marshaller: ResponseMarshaller::new(encoding),
            default_status_code: config.default_status_code,
            rethrow_errors: config.rethrow_errors,
        }
    }

    /// The wrapped processor.
    #[must_use]
    pub fn processor(&self) -> &P {
        &self.processor
    }

    /// The response encoding policy.
    #[must_use]
    pub fn encoding(&self) -> &EncodingPolicy {
        self.response_marshaller.encoding()
    }

    /// Mutable access to the response encoding policy, for registration at startup.
    pub fn encoding_mut(&mut self) -> &mut EncodingPolicy {
        self.response_marshaller.encoding_mut()
    }

    /// Handle one proxy event.
    ///
    /// Processor failures produce a response with status 500 (unless the
    /// processor already set a status) and an `ErrorType` header. In rethrow
    /// mode the same response is returned inside [`DispatchError::Rethrown`].
    /// Request marshalling failures are returned as [`DispatchError::Request`]
    /// without running the processor.
    pub async fn dispatch(
        &self,
        event: ProxyRequest,
        lambda: LambdaContext,
    ) -> Result<ProxyResponse, DispatchError> {
        let request_id = lambda.request_id.clone();

        let mut request = HttpRequestFeatures::default();
        self.request_marshaller.marshal(&mut request, &event)?;

        let mut context = ContextGuard::new(InvocationContext::new(
            request,
            lambda,
            Arc::new(event),
        ));

        tracing::info!(
            request_id = %request_id,
            method = %context.request.method,
            path = %context.request.path,
            "processing proxy request",
        );

        let result = AssertUnwindSafe(self.processor.process(&mut context))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(ProcessorError::panic(&*payload)));
        let outcome = InvocationOutcome::classify(result);
        outcome.report(&request_id);

        let status_code_if_unset = if outcome.is_faulted() {
            FAILURE_STATUS_CODE
        } else {
            self.default_status_code
        };
        let mut response = self
            .response_marshaller
            .marshal(&mut context.response, status_code_if_unset);
        if let Some(error_type) = outcome.error_type() {
            // Overrides any spelling of the header the processor wrote.
            response
                .headers
                .retain(|name, _| !name.eq_ignore_ascii_case(ERROR_TYPE_HEADER));
            response
                .headers
                .insert(ERROR_TYPE_HEADER.to_owned(), error_type.to_owned());
        }

        context.finalize();

        tracing::info!(
            request_id = %request_id,
            status_code = response.status_code,
            base64 = response.is_base64_encoded,
            "proxy request completed",
        );

        match outcome.into_failure() {
            Some(failure) if self.rethrow_errors => Err(DispatchError::Rethrown {
                failure,
                response: Box::new(response),
            }),
            _ => Ok(response),
        }
    }

    /// Handle one proxy event given as JSON, returning the response as JSON.
    pub async fn dispatch_json(
        &self,
        event: serde_json::Value,
        lambda: LambdaContext,
    ) -> Result<serde_json::Value, DispatchError> {
        let event: ProxyRequest =
            serde_json::from_value(event).map_err(DispatchError::InvalidEvent)?;
        let response = self.dispatch(event, lambda).await?;
        serde_json::to_value(&response).map_err(DispatchError::Serialize)
    }
}
