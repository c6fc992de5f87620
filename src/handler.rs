//! How a [`Backoff`](crate::Backoff) classifies errors and resolves its terminal outcome.
use std::backtrace::Backtrace;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

use crate::error::HandlerError;

type Predicate<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;
type Substitute = Arc<dyn Fn(String) -> Box<dyn Error + Send + Sync> + Send + Sync>;
type FailureCallback<E> =
    Arc<dyn Fn(E, String, Backtrace) -> Result<(), HandlerError> + Send + Sync>;
type SuccessCallback<T> = Arc<dyn Fn(&T) -> Result<(), HandlerError> + Send + Sync>;

/// The error kinds eligible for a retry.
///
/// A kind is a predicate over the operation's error; an error is catchable when any predicate
/// in the set accepts it.
///
/// ```
/// use std::io;
/// use backoff_utils::Catch;
///
/// let catch = Catch::only(|e: &io::Error| e.kind() == io::ErrorKind::TimedOut)
///     .or(|e: &io::Error| e.kind() == io::ErrorKind::ConnectionReset);
///
/// assert!(catch.is_catchable(&io::Error::from(io::ErrorKind::TimedOut)));
/// assert!(!catch.is_catchable(&io::Error::from(io::ErrorKind::NotFound)));
/// ```
pub enum Catch<E> {
    /// Every error is retried.
    All,
    /// Only errors accepted by one of the predicates are retried.
    Kinds(Vec<Predicate<E>>),
}

impl<E> Default for Catch<E> {
    fn default() -> Self {
        Catch::All
    }
}

impl<E> Clone for Catch<E> {
    fn clone(&self) -> Self {
        match self {
            Catch::All => Catch::All,
            Catch::Kinds(kinds) => Catch::Kinds(kinds.clone()),
        }
    }
}

impl<E> fmt::Debug for Catch<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Catch::All => f.write_str("All"),
            Catch::Kinds(kinds) => write!(f, "Kinds({})", kinds.len()),
        }
    }
}

impl<E> Catch<E> {
    /// A set holding a single kind.
    pub fn only<F>(kind: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        Catch::Kinds(vec![Arc::new(kind)])
    }

    /// Adds a kind to the set. Has no effect on [`Catch::All`].
    pub fn or<F>(self, kind: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        match self {
            Catch::All => Catch::All,
            Catch::Kinds(mut kinds) => {
                kinds.push(Arc::new(kind));
                Catch::Kinds(kinds)
            }
        }
    }

    pub fn is_catchable(&self, error: &E) -> bool {
        match self {
            Catch::All => true,
            Catch::Kinds(kinds) => kinds.iter().any(|kind| kind(error)),
        }
    }
}

/// What happens once the operation has failed for good.
pub enum OnFailure<E> {
    /// Return the recorded error unchanged.
    Raise,
    /// Return a different error built from the recorded error's message.
    Substitute(Substitute),
    /// Hand the recorded error, its message and a backtrace to a callback.
    ///
    /// An error returned by the callback replaces the original one; otherwise the call completes
    /// without a value.
    Callback(FailureCallback<E>),
}

impl<E> Default for OnFailure<E> {
    fn default() -> Self {
        OnFailure::Raise
    }
}

impl<E> Clone for OnFailure<E> {
    fn clone(&self) -> Self {
        match self {
            OnFailure::Raise => OnFailure::Raise,
            OnFailure::Substitute(make) => OnFailure::Substitute(Arc::clone(make)),
            OnFailure::Callback(callback) => OnFailure::Callback(Arc::clone(callback)),
        }
    }
}

impl<E> fmt::Debug for OnFailure<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OnFailure::Raise => f.write_str("Raise"),
            OnFailure::Substitute(_) => f.write_str("Substitute(..)"),
            OnFailure::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

impl<E> OnFailure<E> {
    /// Replace the failure with the error built by `make` from the original message.
    pub fn substitute<F, S>(make: F) -> Self
    where
        F: Fn(String) -> S + Send + Sync + 'static,
        S: Error + Send + Sync + 'static,
    {
        OnFailure::Substitute(Arc::new(
            move |message: String| -> Box<dyn Error + Send + Sync> { Box::new(make(message)) },
        ))
    }

    pub fn callback<F>(callback: F) -> Self
    where
        F: Fn(E, String, Backtrace) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        OnFailure::Callback(Arc::new(callback))
    }
}

/// Called with the final value before it is returned to the caller.
pub struct OnSuccess<T>(SuccessCallback<T>);

impl<T> OnSuccess<T> {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&T) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        Self(Arc::new(callback))
    }

    pub(crate) fn call(&self, value: &T) -> Result<(), HandlerError> {
        (self.0)(value)
    }
}

impl<T> Clone for OnSuccess<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> fmt::Debug for OnSuccess<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OnSuccess(..)")
    }
}
