//! Errors surfaced by the backoff engine.
use std::error::Error;
use std::time::Duration;

use thiserror::Error;

/// Error returned by a user supplied failure or success handler.
pub type HandlerError = Box<dyn Error + Send + Sync + 'static>;

/// Malformed configuration, detected before any attempt runs.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid argument: {0}")]
pub struct InvalidArgument(pub String);

impl InvalidArgument {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Terminal failure of a [`Backoff`](crate::Backoff) call.
#[derive(Debug, Error)]
pub enum BackoffError<E> {
    /// The strategy or the resolved configuration was rejected.
    #[error(transparent)]
    InvalidArgument(#[from] InvalidArgument),

    /// The error raised by the operation itself, passed through unchanged.
    #[error("{0}")]
    Operation(E),

    /// The deadline expired before any attempt had failed.
    #[error("backoff timed out after: {elapsed:?}")]
    Timeout { elapsed: Duration },

    /// The substitute error built by [`OnFailure::Substitute`](crate::OnFailure::Substitute).
    #[error("{0}")]
    Substituted(Box<dyn Error + Send + Sync + 'static>),

    /// A failure or success handler raised; it replaces the original outcome.
    #[error("handler failed: {0}")]
    Handler(HandlerError),
}

impl<E> BackoffError<E> {
    /// Returns the operation's error, if that is what ended the call.
    pub fn into_operation(self) -> Option<E> {
        match self {
            BackoffError::Operation(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, BackoffError::Timeout { .. })
    }

    /// Attempts to downcast a substituted error to its concrete type.
    pub fn substituted<S: Error + 'static>(&self) -> Option<&S> {
        match self {
            BackoffError::Substituted(err) => err.downcast_ref::<S>(),
            _ => None,
        }
    }
}

pub type BackoffResult<T, E> = Result<T, BackoffError<E>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error, PartialEq)]
    #[error("replaced: {0}")]
    struct Replaced(String);

    #[test]
    fn operation_error_displays_unchanged() {
        let err: BackoffError<&str> = BackoffError::Operation("boom");
        assert_eq!(err.to_string(), "boom");
        assert_eq!(err.into_operation(), Some("boom"));
    }

    #[test]
    fn invalid_argument_converts() {
        let err: BackoffError<&str> = InvalidArgument::new("scale_factor must be positive").into();
        assert_eq!(err.to_string(), "invalid argument: scale_factor must be positive");
        assert!(!err.is_timeout());
    }

    #[test]
    fn substituted_downcasts() {
        let err: BackoffError<&str> = BackoffError::Substituted(Box::new(Replaced("x".into())));
        assert_eq!(err.substituted::<Replaced>(), Some(&Replaced("x".into())));
        assert_eq!(err.to_string(), "replaced: x");
    }
}
