use std::backtrace::Backtrace;
use std::fmt::Display;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::config::BackoffConfig;
use crate::error::{BackoffError, BackoffResult, HandlerError};
use crate::handler::{Catch, OnFailure, OnSuccess};
use crate::strategy::{BackoffStrategy, Strategy};

/// Retry configuration bound once and reused across calls.
///
/// A `Backoff` holds the strategy, limits, catchable error kinds and terminal handlers. Each
/// call to [`execute`](Backoff::execute), [`execute_with`](Backoff::execute_with),
/// [`execute_async`](Backoff::execute_async) or a [`wrap`](Backoff::wrap)ped operation keeps its
/// own attempt counter, so a single `Backoff` can serve independent callers.
///
/// Calls return `Ok(Some(value))` on success and `Err(..)` on failure. `Ok(None)` is only
/// produced when an [`OnFailure::Callback`] consumed the failure without returning an error.
///
/// ```
/// use std::time::Duration;
/// use backoff_utils::{Backoff, Catch};
/// use backoff_utils::strategy::Fibonacci;
///
/// let mut calls = 0;
/// let value = Backoff::new()
///     .strategy(Fibonacci::new().jitter(false).scale_factor(0.001))
///     .max_tries(5)
///     .max_delay(Duration::from_secs(10))
///     .catch(Catch::only(|e: &&str| *e == "busy"))
///     .execute(|| {
///         calls += 1;
///         if calls < 3 { Err("busy") } else { Ok(calls) }
///     })
///     .unwrap();
///
/// assert_eq!(value, Some(3));
/// ```
pub struct Backoff<T, E, S = Strategy> {
    pub(crate) strategy: S,
    pub(crate) max_tries: Option<u32>,
    pub(crate) max_delay: Option<Duration>,
    pub(crate) defaults: BackoffConfig,
    pub(crate) catch: Catch<E>,
    pub(crate) on_failure: OnFailure<E>,
    pub(crate) on_success: Option<OnSuccess<T>>,
}

impl<T, E> Backoff<T, E> {
    /// Exponential strategy, default limits, every error retried, failures raised unchanged.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T, E> Default for Backoff<T, E> {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            max_tries: None,
            max_delay: None,
            defaults: BackoffConfig::default(),
            catch: Catch::All,
            on_failure: OnFailure::Raise,
            on_success: None,
        }
    }
}

impl<T, E, S: Clone> Clone for Backoff<T, E, S> {
    fn clone(&self) -> Self {
        Self {
            strategy: self.strategy.clone(),
            max_tries: self.max_tries,
            max_delay: self.max_delay,
            defaults: self.defaults.clone(),
            catch: self.catch.clone(),
            on_failure: self.on_failure.clone(),
            on_success: self.on_success.clone(),
        }
    }
}

impl<T, E, S> Backoff<T, E, S> {
    /// Replaces the delay strategy.
    pub fn strategy<S2: BackoffStrategy>(self, strategy: S2) -> Backoff<T, E, S2> {
        Backoff {
            strategy,
            max_tries: self.max_tries,
            max_delay: self.max_delay,
            defaults: self.defaults,
            catch: self.catch,
            on_failure: self.on_failure,
            on_success: self.on_success,
        }
    }

    /// Number of retries after the initial attempt; at most `max_tries + 1` invocations.
    pub fn max_tries(mut self, max_tries: u32) -> Self {
        self.max_tries = Some(max_tries);
        self
    }

    /// Wall-clock ceiling measured from the first attempt, checked before every attempt.
    pub fn max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = Some(max_delay);
        self
    }

    /// Defaults used when [`max_tries`](Self::max_tries) or [`max_delay`](Self::max_delay) are
    /// not set.
    pub fn defaults(mut self, defaults: BackoffConfig) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn catch(mut self, catch: Catch<E>) -> Self {
        self.catch = catch;
        self
    }

    pub fn on_failure(mut self, on_failure: OnFailure<E>) -> Self {
        self.on_failure = on_failure;
        self
    }

    pub fn on_success<F>(mut self, on_success: F) -> Self
    where
        F: Fn(&T) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.on_success = Some(OnSuccess::new(on_success));
        self
    }
}

impl<T, E, S> Backoff<T, E, S>
where
    E: Display,
    S: BackoffStrategy,
{
    /// Validates the configuration and starts the clock.
    pub(crate) fn begin(&self) -> BackoffResult<Run<'_, T, E, S>, E> {
        self.strategy.validate()?;
        let deadline = match self.max_delay {
            Some(max_delay) => Some(max_delay),
            None => self.defaults.deadline()?,
        };

        Ok(Run {
            policy: self,
            started: Instant::now(),
            max_tries: self.max_tries.unwrap_or(self.defaults.max_tries),
            deadline,
            attempt: 0,
            last_error: None,
        })
    }

    fn succeed(&self, value: T) -> BackoffResult<Option<T>, E> {
        if let Some(on_success) = &self.on_success {
            on_success.call(&value).map_err(BackoffError::Handler)?;
        }
        Ok(Some(value))
    }

    fn fail(&self, error: E) -> BackoffResult<Option<T>, E> {
        match &self.on_failure {
            OnFailure::Raise => Err(BackoffError::Operation(error)),
            OnFailure::Substitute(make) => Err(BackoffError::Substituted(make(error.to_string()))),
            OnFailure::Callback(callback) => {
                let message = error.to_string();
                callback(error, message, Backtrace::capture()).map_err(BackoffError::Handler)?;
                Ok(None)
            }
        }
    }
}

/// The operation and arguments for one call.
///
/// `A` carries whatever the operation needs; use a tuple or a struct for several positional or
/// named arguments. Attempts after the first use the retry operation and retry arguments when
/// they are set, and fall back to the first-attempt ones otherwise.
///
/// ```
/// use backoff_utils::{Backoff, Invocation};
/// use backoff_utils::strategy::Linear;
///
/// let invocation = Invocation::with_args(
///     |(path, verbose): &(&str, bool)| if *verbose { Err("cold cache") } else { Ok(path.len()) },
///     ("/var/cache", true),
/// )
/// .retry_args(("/var/cache", false));
///
/// let len = Backoff::new()
///     .strategy(Linear::new().jitter(false))
///     .execute_with(invocation)
///     .unwrap();
/// assert_eq!(len, Some(10));
/// ```
pub struct Invocation<'a, A, T, E> {
    operation: Box<dyn FnMut(&A) -> Result<T, E> + 'a>,
    retry_operation: Option<Box<dyn FnMut(&A) -> Result<T, E> + 'a>>,
    args: A,
    retry_args: Option<A>,
}

impl<'a, T, E> Invocation<'a, (), T, E> {
    /// An operation taking no arguments.
    pub fn new<F>(mut operation: F) -> Self
    where
        F: FnMut() -> Result<T, E> + 'a,
    {
        Self::with_args(move |_: &()| operation(), ())
    }

    /// Uses `operation` for every attempt after the first.
    pub fn retry_with<F>(self, mut operation: F) -> Self
    where
        F: FnMut() -> Result<T, E> + 'a,
    {
        self.retry_operation(move |_: &()| operation())
    }
}

impl<'a, A, T, E> Invocation<'a, A, T, E> {
    pub fn with_args<F>(operation: F, args: A) -> Self
    where
        F: FnMut(&A) -> Result<T, E> + 'a,
    {
        Self {
            operation: Box::new(operation),
            retry_operation: None,
            args,
            retry_args: None,
        }
    }

    /// Uses `operation` for every attempt after the first.
    pub fn retry_operation<F>(mut self, operation: F) -> Self
    where
        F: FnMut(&A) -> Result<T, E> + 'a,
    {
        self.retry_operation = Some(Box::new(operation));
        self
    }

    /// Uses `args` for every attempt after the first.
    pub fn retry_args(mut self, args: A) -> Self {
        self.retry_args = Some(args);
        self
    }

    pub(crate) fn call(&mut self, attempt: u32) -> Result<T, E> {
        if attempt == 0 {
            return (self.operation)(&self.args);
        }
        let args = self.retry_args.as_ref().unwrap_or(&self.args);
        match self.retry_operation.as_mut() {
            Some(retry_operation) => retry_operation(args),
            None => (self.operation)(args),
        }
    }
}

/// Outcome of a failed attempt.
pub(crate) enum Step<T, E> {
    /// Back off after the given attempt, then try again.
    Retry(u32),
    Done(BackoffResult<Option<T>, E>),
}

/// Per-call attempt bookkeeping.
pub(crate) struct Run<'p, T, E, S> {
    policy: &'p Backoff<T, E, S>,
    started: Instant,
    max_tries: u32,
    deadline: Option<Duration>,
    attempt: u32,
    last_error: Option<E>,
}

impl<T, E, S> Run<'_, T, E, S>
where
    E: Display,
    S: BackoffStrategy,
{
    pub(crate) fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Ends the call before the next attempt once the try budget is spent or the deadline has
    /// passed.
    pub(crate) fn check_next(&mut self) -> Option<BackoffResult<Option<T>, E>> {
        if self.attempt > self.max_tries {
            let error = self.last_error.take()?;
            warn!(
                attempts = self.attempt,
                max_tries = self.max_tries,
                error = %error,
                "operation failed after all retry attempts"
            );
            return Some(self.policy.fail(error));
        }
        self.check_deadline()
    }

    /// Before any failure an expired deadline is a [`BackoffError::Timeout`]; afterwards the
    /// last recorded failure goes through the failure handler instead.
    fn check_deadline(&mut self) -> Option<BackoffResult<Option<T>, E>> {
        let deadline = self.deadline?;
        let elapsed = self.started.elapsed();
        if elapsed < deadline {
            return None;
        }

        match self.last_error.take() {
            None => {
                warn!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    "backoff deadline expired before the first attempt"
                );
                Some(Err(BackoffError::Timeout { elapsed }))
            }
            Some(error) => {
                warn!(
                    attempts = self.attempt,
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %error,
                    "backoff deadline expired"
                );
                Some(self.policy.fail(error))
            }
        }
    }

    pub(crate) fn succeed(self, value: T) -> BackoffResult<Option<T>, E> {
        if self.attempt > 0 {
            debug!(
                attempts = self.attempt + 1,
                retries = self.attempt,
                "operation succeeded after retries"
            );
        }
        self.policy.succeed(value)
    }

    pub(crate) fn fail(&mut self, error: E) -> Step<T, E> {
        let attempt = self.attempt;

        if !self.policy.catch.is_catchable(&error) {
            warn!(attempt, error = %error, "operation failed with a non-retryable error");
            return Step::Done(self.policy.fail(error));
        }

        debug!(
            attempt,
            max_tries = self.max_tries,
            error = %error,
            "attempt failed, backing off"
        );
        self.last_error = Some(error);
        self.attempt = self.attempt.saturating_add(1);
        Step::Retry(attempt)
    }
}
