//! Per-invocation processing context.
//!
//! An [`InvocationContext`] bundles the request and response features with
//! the correlation data of one invocation. It lives exactly as long as the
//! invocation: the dispatcher wraps it in a [`ContextGuard`] that tears it
//! down once, whichever way the invocation ends.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};

use rustack_lambda_proxy_model::ProxyRequest;

use crate::features::{HttpRequestFeatures, HttpResponseFeatures};

/// Correlation data supplied by the function host for one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LambdaContext {
    /// Invocation request id.
    pub request_id: String,
    /// Name of the function being invoked.
    pub function_name: String,
    /// Point in time after which the host abandons the invocation.
    pub deadline: Option<DateTime<Utc>>,
}

impl LambdaContext {
    /// Create a context for the given request id and function name.
    #[must_use]
    pub fn new(request_id: impl Into<String>, function_name: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            function_name: function_name.into(),
            deadline: None,
        }
    }

    /// Create a context with a freshly generated request id, for local runs.
    #[must_use]
    pub fn local(function_name: impl Into<String>) -> Self {
        Self::new(uuid::Uuid::new_v4().to_string(), function_name)
    }

    /// Set the invocation deadline.
    #[must_use]
    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Time left before the deadline; zero once it has passed.
    #[must_use]
    pub fn remaining_time(&self) -> Option<TimeDelta> {
        self.deadline
            .map(|deadline| (deadline - Utc::now()).max(TimeDelta::zero()))
    }
}

type TeardownHook = Box<dyn FnOnce() + Send>;

/// Resources and correlation data of one invocation, handed to the processor.
pub struct InvocationContext {
    /// Request features built from the proxy event.
    pub request: HttpRequestFeatures,
    /// Response features filled in by the processor.
    pub response: HttpResponseFeatures,
    lambda: LambdaContext,
    event: Arc<ProxyRequest>,
    teardown_hooks: Vec<TeardownHook>,
}

impl fmt::Debug for InvocationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationContext")
            .field("request", &self.request)
            .field("response", &self.response)
            .field("lambda", &self.lambda)
            .field("teardown_hooks", &self.teardown_hooks.len())
            .finish_non_exhaustive()
    }
}

impl InvocationContext {
    /// Create a context for a marshalled request.
    #[must_use]
    pub fn new(request: HttpRequestFeatures, lambda: LambdaContext, event: Arc<ProxyRequest>) -> Self {
        Self {
            request,
            response: HttpResponseFeatures::default(),
            lambda,
            event,
            teardown_hooks: Vec::new(),
        }
    }

    /// Host correlation data.
    #[must_use]
    pub fn lambda_context(&self) -> &LambdaContext {
        &self.lambda
    }

    /// The original proxy event.
    #[must_use]
    pub fn event(&self) -> &Arc<ProxyRequest> {
        &self.event
    }

    /// Register a hook to run when the context is torn down.
    ///
    /// Hooks run in reverse registration order, exactly once.
    pub fn on_teardown(&mut self, hook: impl FnOnce() + Send + 'static) {
        self.teardown_hooks.push(Box::new(hook));
    }

    /// Release everything the invocation holds.
    fn teardown(&mut self) {
        let hooks = self.teardown_hooks.len();
        while let Some(hook) = self.teardown_hooks.pop() {
            hook();
        }
        self.response.take_body();
        self.request.body = None;
        tracing::debug!(
            request_id = %self.lambda.request_id,
            hooks,
            "invocation context torn down",
        );
    }
}

/// Scope guard that tears its [`InvocationContext`] down exactly once.
///
/// [`finalize`](Self::finalize) performs the teardown explicitly; dropping the
/// guard performs it if that has not happened yet, which covers early returns
/// and a dispatch future dropped while the processor is running.
#[derive(Debug)]
pub struct ContextGuard {
    context: InvocationContext,
    finalized: bool,
}

impl ContextGuard {
    /// Take ownership of a context.
    #[must_use]
    pub fn new(context: InvocationContext) -> Self {
        Self {
            context,
            finalized: false,
        }
    }

    /// Tear the context down now. Later calls do nothing.
    pub fn finalize(&mut self) {
        if !self.finalized {
            self.finalized = true;
            self.context.teardown();
        }
    }

    /// Whether the context has been torn down.
    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }
}

impl Deref for ContextGuard {
    type Target = InvocationContext;

    fn deref(&self) -> &Self::Target {
        &self.context
    }
}

impl DerefMut for ContextGuard {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.context
    }
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        self.finalize();
    }
}
