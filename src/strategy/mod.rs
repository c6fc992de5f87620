//! Delay algorithms for retryable operations.
//!
//! Every algorithm implements [`BackoffStrategy::base_delay`]; adding jitter, scaling, flooring
//! and sleeping is shared by all of them through the trait's provided methods.
use std::thread;
use std::time::Duration;

use crate::error::InvalidArgument;

macro_rules! option_setters {
    ($name:ident) => {
        impl $name {
            /// Enables or disables jitter.
            pub fn jitter(mut self, jitter: bool) -> Self {
                self.options.jitter = jitter;
                self
            }

            /// Sets the factor applied to the jittered delay.
            pub fn scale_factor(mut self, scale_factor: f64) -> Self {
                self.options.scale_factor = scale_factor;
                self
            }

            /// Sets the floor, in seconds, of the final wait.
            pub fn minimum(mut self, minimum: f64) -> Self {
                self.options.minimum = minimum;
                self
            }

            /// Replaces all shared options at once.
            pub fn with_options(mut self, options: $crate::strategy::StrategyOptions) -> Self {
                self.options = options;
                self
            }
        }
    };
}

/// Base delay of `2^attempt` seconds.
pub mod exponential;
pub use exponential::Exponential;

/// Base delay following the fibonacci sequence.
pub mod fibonacci;
pub use fibonacci::Fibonacci;

/// Base delay read from a configured sequence.
pub mod fixed;
pub use fixed::Fixed;

/// Base delay equal to the attempt number.
pub mod linear;
pub use linear::Linear;

/// Base delay of `attempt^exponent` seconds.
pub mod polynomial;
pub use polynomial::Polynomial;

mod kind;
pub use kind::{Strategy, StrategyKind, StrategyParams};

/// Options shared by every strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StrategyOptions {
    /// Add a uniformly random `[0, 1)` seconds to the base delay.
    pub jitter: bool,
    /// Multiplies the jittered delay.
    pub scale_factor: f64,
    /// Floor, in seconds, applied to the final wait.
    pub minimum: f64,
}

impl Default for StrategyOptions {
    fn default() -> Self {
        Self {
            jitter: true,
            scale_factor: 1.0,
            minimum: 0.0,
        }
    }
}

impl StrategyOptions {
    pub fn validate(&self) -> Result<(), InvalidArgument> {
        if !self.scale_factor.is_finite() || self.scale_factor <= 0.0 {
            return Err(InvalidArgument::new(format!(
                "scale_factor must be a positive number, got {}",
                self.scale_factor
            )));
        }
        if !self.minimum.is_finite() || self.minimum < 0.0 {
            return Err(InvalidArgument::new(format!(
                "minimum must be a non-negative number, got {}",
                self.minimum
            )));
        }
        Ok(())
    }
}

/// Converts an attempt index into a wait, and performs the wait.
///
/// Implementors provide the algorithm-specific [`base_delay`](BackoffStrategy::base_delay) in
/// seconds; the remaining methods should not be overridden.
///
/// ```
/// use std::time::Duration;
/// use backoff_utils::strategy::{BackoffStrategy, Exponential};
///
/// let strategy = Exponential::new().jitter(false).scale_factor(0.5);
/// assert_eq!(strategy.wait_time(3), Duration::from_secs(4));
/// ```
pub trait BackoffStrategy {
    /// Base delay in seconds for the 0-based `attempt` that just failed.
    fn base_delay(&self, attempt: u32) -> f64;

    /// Jitter, scale factor and minimum applied on top of the base delay.
    fn options(&self) -> &StrategyOptions;

    /// Checks the configuration. Called by the engine before the first attempt.
    fn validate(&self) -> Result<(), InvalidArgument> {
        self.options().validate()
    }

    /// The wait after `attempt`, using the strategy's own options.
    fn wait_time(&self, attempt: u32) -> Duration {
        self.wait_time_with(attempt, self.options())
    }

    /// The wait after `attempt`, using `options` instead of the strategy's own.
    fn wait_time_with(&self, attempt: u32, options: &StrategyOptions) -> Duration {
        let mut seconds = self.base_delay(attempt);
        if options.jitter {
            seconds += rand::random::<f64>();
        }
        seconds *= options.scale_factor;
        to_duration(seconds.max(options.minimum))
    }

    /// Blocks the calling thread for [`wait_time`](BackoffStrategy::wait_time).
    fn delay(&self, attempt: u32) {
        thread::sleep(self.wait_time(attempt));
    }

    /// Blocks the calling thread for [`wait_time_with`](BackoffStrategy::wait_time_with).
    fn delay_with(&self, attempt: u32, options: &StrategyOptions) {
        thread::sleep(self.wait_time_with(attempt, options));
    }

    /// Iterates over the waits for attempts `0, 1, 2, ...`.
    fn schedule(&self) -> Schedule<'_, Self>
    where
        Self: Sized,
    {
        Schedule {
            strategy: self,
            attempt: 0,
        }
    }
}

impl<S: BackoffStrategy + ?Sized> BackoffStrategy for &S {
    fn base_delay(&self, attempt: u32) -> f64 {
        (**self).base_delay(attempt)
    }

    fn options(&self) -> &StrategyOptions {
        (**self).options()
    }

    fn validate(&self) -> Result<(), InvalidArgument> {
        (**self).validate()
    }
}

/// Iterator over the successive waits of a strategy. See [`BackoffStrategy::schedule`].
#[derive(Debug)]
pub struct Schedule<'a, S> {
    strategy: &'a S,
    attempt: u32,
}

impl<S: BackoffStrategy> Iterator for Schedule<'_, S> {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let duration = self.strategy.wait_time(self.attempt);
        self.attempt = self.attempt.checked_add(1)?;
        Some(duration)
    }
}

/// Seconds to a [`Duration`], saturating instead of panicking.
pub(crate) fn to_duration(seconds: f64) -> Duration {
    if seconds.is_nan() || seconds <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX)
}
