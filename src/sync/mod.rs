//! Blocking retry of operations that may fail.
use std::fmt::Display;

use crate::backoff::{Backoff, Invocation, Step};
use crate::error::BackoffResult;
use crate::strategy::BackoffStrategy;

impl<T, E, S> Backoff<T, E, S>
where
    E: Display,
    S: BackoffStrategy,
{
    /// Execute an operation and retry it, blocking between attempts, until it succeeds, fails
    /// with an error outside the [`Catch`](crate::Catch) set, runs out of tries or passes the
    /// deadline.
    ///
    /// # Examples
    ///
    /// ```
    /// use backoff_utils::Backoff;
    /// use backoff_utils::strategy::Exponential;
    ///
    /// // Try to get data from a potentially failing API
    /// let result = Backoff::new()
    ///     .strategy(Exponential::new().scale_factor(0.001))
    ///     .max_tries(3)
    ///     .execute(|| {
    ///         let response = make_api_request();
    ///         if response.is_success() {
    ///             Ok(response.data)
    ///         } else {
    ///             Err(response.error)
    ///         }
    ///     });
    ///
    /// match result {
    ///     Ok(data) => println!("Successfully retrieved data: {:?}", data),
    ///     Err(e) => println!("Failed after multiple retries: {}", e),
    /// }
    /// # fn make_api_request() -> Response { Response { is_success: true, data: "data", error: "error" } }
    /// # struct Response { is_success: bool, data: &'static str, error: &'static str }
    /// # impl Response { fn is_success(&self) -> bool { self.is_success } }
    /// ```
    pub fn execute<F>(&self, operation: F) -> BackoffResult<Option<T>, E>
    where
        F: FnMut() -> Result<T, E>,
    {
        self.execute_with(Invocation::new(operation))
    }

    /// Like [`execute`](Self::execute), with separate operations or arguments for retries.
    pub fn execute_with<A>(
        &self,
        mut invocation: Invocation<'_, A, T, E>,
    ) -> BackoffResult<Option<T>, E> {
        let mut run = self.begin()?;

        loop {
            if let Some(outcome) = run.check_next() {
                return outcome;
            }

            match invocation.call(run.attempt()) {
                Ok(value) => return run.succeed(value),
                Err(err) => match run.fail(err) {
                    Step::Retry(attempt) => self.strategy.delay(attempt),
                    Step::Done(outcome) => return outcome,
                },
            }
        }
    }

    /// Binds this configuration to `operation`, returning a function that retries it with
    /// whatever arguments it is called with.
    ///
    /// ```
    /// use backoff_utils::Backoff;
    /// use backoff_utils::strategy::Fixed;
    ///
    /// let mut parse = Backoff::new()
    ///     .strategy(Fixed::from_sequence([0]).jitter(false))
    ///     .max_tries(1)
    ///     .wrap(|input: &String| input.trim().parse::<u16>());
    ///
    /// assert_eq!(parse(" 8080 ".to_string()).unwrap(), Some(8080));
    /// assert!(parse("http".to_string()).is_err());
    /// ```
    pub fn wrap<A, F>(self, mut operation: F) -> impl FnMut(A) -> BackoffResult<Option<T>, E>
    where
        F: FnMut(&A) -> Result<T, E>,
    {
        move |args| self.execute_with(Invocation::with_args(&mut operation, args))
    }
}
