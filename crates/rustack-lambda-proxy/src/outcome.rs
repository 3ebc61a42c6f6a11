//! Classified result of running the processor.

use crate::error::ProcessorError;

/// What happened when the processor ran.
#[derive(Debug)]
pub enum InvocationOutcome {
    /// The processor completed.
    Succeeded,
    /// The processor raised several failures at once.
    Aggregate(ProcessorError),
    /// A module required by the processor failed to load.
    Load(ProcessorError),
    /// Any other processor failure.
    Unclassified(ProcessorError),
}

impl InvocationOutcome {
    /// Classify a processor result.
    #[must_use]
    pub fn classify(result: Result<(), ProcessorError>) -> Self {
        match result {
            Ok(()) => Self::Succeeded,
            Err(err @ ProcessorError::Aggregate(_)) => Self::Aggregate(err),
            Err(err @ ProcessorError::Load { .. }) => Self::Load(err),
            Err(err @ ProcessorError::Unclassified { .. }) => Self::Unclassified(err),
        }
    }

    /// Whether the processor failed.
    #[must_use]
    pub fn is_faulted(&self) -> bool {
        !matches!(self, Self::Succeeded)
    }

    /// Classification name for the `ErrorType` header, `None` on success.
    #[must_use]
    pub fn error_type(&self) -> Option<&str> {
        self.failure().map(ProcessorError::classification_name)
    }

    /// The failure, if any.
    #[must_use]
    pub fn failure(&self) -> Option<&ProcessorError> {
        match self {
            Self::Succeeded => None,
            Self::Aggregate(err) | Self::Load(err) | Self::Unclassified(err) => Some(err),
        }
    }

    /// Consume the outcome, returning the failure if any.
    #[must_use]
    pub fn into_failure(self) -> Option<ProcessorError> {
        match self {
            Self::Succeeded => None,
            Self::Aggregate(err) | Self::Load(err) | Self::Unclassified(err) => Some(err),
        }
    }

    /// Log the failure with its full cause chain.
    pub fn report(&self, request_id: &str) {
        match self {
            Self::Succeeded => {}
            Self::Aggregate(err) => {
                let ProcessorError::Aggregate(inner) = err else {
                    return report_failure(request_id, err);
                };
                tracing::error!(
                    request_id,
                    error_type = err.classification_name(),
                    count = inner.len(),
                    "{err}",
                );
                for (index, failure) in inner.iter().enumerate() {
                    tracing::error!(
                        request_id,
                        index,
                        error_type = failure.classification_name(),
                        causes = ?failure.causes(),
                        "{failure}",
                    );
                }
            }
            Self::Load(err) => match err {
                ProcessorError::Load {
                    module,
                    missing_file: Some(file),
                    ..
                } => {
                    tracing::error!(
                        request_id,
                        error_type = err.classification_name(),
                        module = %module,
                        file = %file,
                        causes = ?err.causes(),
                        "dependency not found while loading module",
                    );
                }
                _ => report_failure(request_id, err),
            },
            Self::Unclassified(err) => report_failure(request_id, err),
        }
    }
}

fn report_failure(request_id: &str, err: &ProcessorError) {
    tracing::error!(
        request_id,
        error_type = err.classification_name(),
        causes = ?err.causes(),
        "unhandled failure while processing request: {err}",
    );
}
