//! Error types for proxy marshalling and invocation dispatch.

use std::borrow::Cow;

use rustack_lambda_proxy_model::ProxyResponse;

/// Boxed error used for processor failure sources.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure while turning a proxy event into request features.
///
/// These are not contained by the dispatcher: they point at a misconfigured
/// upstream gateway rather than at a single bad call.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// `X-Forwarded-Port` is not a port number.
    #[error("invalid X-Forwarded-Port header value {value:?}")]
    InvalidForwardedPort {
        /// The offending header value.
        value: String,
        /// Parse failure.
        #[source]
        source: std::num::ParseIntError,
    },

    /// The event declared a Base64 body that does not decode.
    #[error("request body is declared base64 but does not decode: {0}")]
    InvalidBase64Body(#[from] base64::DecodeError),
}

/// Failure raised by a processor while handling a request.
#[derive(Debug, thiserror::Error)]
pub enum ProcessorError {
    /// Several failures raised together.
    #[error("{} failures occurred while processing the request", .0.len())]
    Aggregate(Vec<ProcessorError>),

    /// A module or component required by the processor could not be loaded.
    #[error("{}", load_message(.module, .missing_file.as_deref()))]
    Load {
        /// Name of the module that failed to load.
        module: String,
        /// File that could not be found, when known.
        missing_file: Option<String>,
        /// Underlying failure.
        #[source]
        source: Option<BoxError>,
    },

    /// Any other failure.
    #[error("{source}")]
    Unclassified {
        /// Short type name of the wrapped failure.
        kind: Cow<'static, str>,
        /// The wrapped failure.
        #[source]
        source: BoxError,
    },
}

fn load_message(module: &str, missing_file: Option<&str>) -> String {
    match missing_file {
        Some(file) => format!("failed to load module `{module}`: file `{file}` not found"),
        None => format!("failed to load module `{module}`"),
    }
}

impl ProcessorError {
    /// Classification name reported in the `ErrorType` response header.
    pub const AGGREGATE: &str = "AggregateFailure";
    /// Classification name for load failures.
    pub const LOAD: &str = "LoadFailure";
    /// Classification name for a processor that panicked.
    pub const PANIC: &str = "Panic";

    /// Wrap an arbitrary error, recording its type name as the classification.
    #[must_use]
    pub fn unclassified<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Unclassified {
            kind: Cow::Borrowed(short_type_name::<E>()),
            source: Box::new(error),
        }
    }

    /// Wrap an already boxed error under an explicit classification name.
    #[must_use]
    pub fn from_boxed(kind: impl Into<Cow<'static, str>>, source: BoxError) -> Self {
        Self::Unclassified {
            kind: kind.into(),
            source,
        }
    }

    /// Build an unclassified failure from a message.
    #[must_use]
    pub fn msg(kind: impl Into<Cow<'static, str>>, message: impl Into<String>) -> Self {
        Self::from_boxed(kind, message.into().into())
    }

    /// Build an unclassified failure from a caught panic payload.
    #[must_use]
    pub fn panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_owned())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "processor panicked".to_owned());
        Self::msg(Self::PANIC, message)
    }

    /// Build a load failure.
    #[must_use]
    pub fn load(module: impl Into<String>, missing_file: Option<String>) -> Self {
        Self::Load {
            module: module.into(),
            missing_file,
            source: None,
        }
    }

    /// Combine several failures.
    #[must_use]
    pub fn aggregate(failures: impl IntoIterator<Item = ProcessorError>) -> Self {
        Self::Aggregate(failures.into_iter().collect())
    }

    /// Name used to classify this failure in logs and the `ErrorType` header.
    #[must_use]
    pub fn classification_name(&self) -> &str {
        match self {
            Self::Aggregate(_) => Self::AGGREGATE,
            Self::Load { .. } => Self::LOAD,
            Self::Unclassified { kind, .. } => kind,
        }
    }

    /// Nested causes as `(type name, message)` pairs, outermost first.
    #[must_use]
    pub fn causes(&self) -> Vec<(String, String)> {
        let mut causes = Vec::new();
        let mut next = next_cause(self);
        while let Some(cause) = next {
            let name = cause
                .downcast_ref::<ProcessorError>()
                .map_or("Error", ProcessorError::classification_name);
            causes.push((name.to_owned(), cause.to_string()));
            next = next_cause(cause);
        }
        causes
    }
}

/// The wrapped error of an unclassified failure is the failure itself, so its
/// chain continues one level further down.
fn next_cause<'a>(
    error: &'a (dyn std::error::Error + 'static),
) -> Option<&'a (dyn std::error::Error + 'static)> {
    match error.downcast_ref::<ProcessorError>() {
        Some(ProcessorError::Unclassified { source, .. }) => source.source(),
        _ => error.source(),
    }
}

impl From<anyhow::Error> for ProcessorError {
    fn from(error: anyhow::Error) -> Self {
        Self::from_boxed("Error", error.into())
    }
}

/// Last path segment of a type name, without generic arguments.
pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Failure returned by [`InvocationDispatcher`](crate::InvocationDispatcher).
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The event could not be marshalled into request features.
    #[error("failed to marshal proxy request: {0}")]
    Request(#[from] RequestError),

    /// The event JSON does not describe a proxy request.
    #[error("invalid proxy request event: {0}")]
    InvalidEvent(#[source] serde_json::Error),

    /// The response could not be serialized.
    #[error("failed to serialize proxy response: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The processor failed while the dispatcher runs in rethrow mode.
    ///
    /// The response that would have been returned is carried along, so the
    /// caller can still answer the gateway after its own error handling.
    #[error("request processing failed: {failure}")]
    Rethrown {
        /// The processor failure.
        #[source]
        failure: ProcessorError,
        /// Response marshalled for the failed invocation (status 500 unless
        /// the processor set one, with an `ErrorType` header).
        response: Box<ProxyResponse>,
    },
}
