//! Asynchronous retry of operations that may fail, sleeping on the tokio timer between attempts.
use std::fmt::Display;
use std::future::Future;

use tokio::time::sleep;

use crate::backoff::{Backoff, Step};
use crate::error::BackoffResult;
use crate::strategy::BackoffStrategy;

/// Waits for the same duration [`BackoffStrategy::delay`] would block for, without blocking
/// the thread.
pub async fn delay<S>(strategy: &S, attempt: u32)
where
    S: BackoffStrategy + ?Sized,
{
    sleep(strategy.wait_time(attempt)).await;
}

impl<T, E, S> Backoff<T, E, S>
where
    E: Display,
    S: BackoffStrategy,
{
    /// Execute an asynchronous operation and retry it with the same rules as
    /// [`execute`](Backoff::execute), awaiting the strategy's delay between attempts.
    ///
    /// # Examples
    ///
    /// ```
    /// use backoff_utils::Backoff;
    /// use backoff_utils::strategy::Exponential;
    ///
    /// # async fn make_api_request() -> Response { Response { is_success: true, data: "data", error: "error" } }
    /// # struct Response { is_success: bool, data: &'static str, error: &'static str }
    /// # impl Response { fn is_success(&self) -> bool { self.is_success } }
    ///
    /// async fn fetch_data() -> Option<String> {
    ///     let result = Backoff::new()
    ///         .strategy(Exponential::new().scale_factor(0.1))
    ///         .max_tries(3)
    ///         .execute_async(|| async {
    ///             let response = make_api_request().await;
    ///             if response.is_success() {
    ///                 Ok(response.data.to_string())
    ///             } else {
    ///                 Err(response.error.to_string())
    ///             }
    ///         })
    ///         .await;
    ///
    ///     match result {
    ///         Ok(data) => data,
    ///         Err(e) => {
    ///             println!("Failed after multiple retries: {}", e);
    ///             None
    ///         }
    ///     }
    /// }
    /// ```
    pub async fn execute_async<OP, F>(&self, mut operation: OP) -> BackoffResult<Option<T>, E>
    where
        OP: FnMut() -> F,
        F: Future<Output = Result<T, E>>,
    {
        let mut run = self.begin()?;

        loop {
            if let Some(outcome) = run.check_next() {
                return outcome;
            }

            // Invoke the factory to obtain a new Future for this attempt.
            match operation().await {
                Ok(value) => return run.succeed(value),
                Err(err) => match run.fail(err) {
                    Step::Retry(attempt) => delay(&self.strategy, attempt).await,
                    Step::Done(outcome) => return outcome,
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};

    use super::*;
    use crate::strategy::{Exponential, Fixed, Linear};
    use crate::{Catch, OnFailure};

    fn quick() -> Exponential {
        Exponential::new().jitter(false).scale_factor(0.001)
    }

    #[tokio::test]
    async fn test_retry() {
        let attempts = Arc::new(Mutex::new(0));
        let attempts_clone = attempts.clone();
        let result = Backoff::new()
            .strategy(quick())
            .execute_async(|| {
                let value = attempts_clone.clone();
                async move {
                    let mut lock = value.lock().unwrap();
                    *lock += 1;
                    if *lock < 2 { Err("Error") } else { Ok("Success") }
                }
            })
            .await;

        assert_eq!(result.unwrap(), Some("Success"));
        assert_eq!(*attempts.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn fails_after_last_try() {
        let mut collection = vec![1].into_iter();

        let res = Backoff::new()
            .strategy(quick())
            .max_tries(1)
            .execute_async(|| {
                let next_val = collection.next();
                async move {
                    match next_val {
                        Some(n) if n == 2 => Ok(n),
                        Some(_) => Err("not 2"),
                        None => Err("exhausted"),
                    }
                }
            })
            .await;

        assert_eq!(res.unwrap_err().into_operation(), Some("exhausted"));
    }

    #[tokio::test]
    async fn always_failing_runs_max_tries_plus_one() {
        let calls = AtomicUsize::new(0);

        let res = Backoff::<(), &str>::new()
            .strategy(quick())
            .max_tries(4)
            .execute_async(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("down") }
            })
            .await;

        assert!(res.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn non_retryable_error_stops_immediately() {
        let calls = AtomicUsize::new(0);

        let res = Backoff::<(), &str>::new()
            .strategy(quick())
            .catch(Catch::only(|e: &&str| *e == "busy"))
            .execute_async(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("denied") }
            })
            .await;

        assert_eq!(res.unwrap_err().into_operation(), Some("denied"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn deadline_asymmetry_is_preserved() {
        let res = Backoff::<(), &str>::new()
            .strategy(quick())
            .max_delay(Duration::ZERO)
            .execute_async(|| async { Err("never runs") })
            .await;
        assert!(res.unwrap_err().is_timeout());

        let res = Backoff::<(), &str>::new()
            .strategy(Fixed::from_sequence([1]).jitter(false).scale_factor(0.03))
            .max_tries(5)
            .max_delay(Duration::from_millis(10))
            .execute_async(|| async { Err("slow") })
            .await;
        assert_eq!(res.unwrap_err().into_operation(), Some("slow"));
    }

    #[tokio::test]
    async fn handlers_run_on_terminal_outcomes() {
        let failures = Arc::new(AtomicUsize::new(0));
        let failures_in_handler = Arc::clone(&failures);

        let res = Backoff::<u8, &str>::new()
            .strategy(quick())
            .max_tries(1)
            .on_failure(OnFailure::callback(move |_: &str, message: String, _| {
                assert_eq!(message, "offline");
                failures_in_handler.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }))
            .execute_async(|| async { Err("offline") })
            .await;

        assert_eq!(res.unwrap(), None);
        assert_eq!(failures.load(Ordering::SeqCst), 1);

        let res = Backoff::<u8, &str>::new()
            .strategy(quick())
            .on_success(|value| if *value == 3 { Ok(()) } else { Err("wrong".into()) })
            .execute_async(|| async { Ok(3) })
            .await;
        assert_eq!(res.unwrap(), Some(3));
    }

    #[tokio::test]
    async fn backs_off_after_the_last_attempt() {
        let started = Instant::now();

        let res = Backoff::<(), &str>::new()
            .strategy(Fixed::from_sequence([1]).jitter(false).scale_factor(0.05))
            .max_tries(0)
            .execute_async(|| async { Err("down") })
            .await;

        assert_eq!(res.unwrap_err().into_operation(), Some("down"));
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn delay_awaits_computed_wait() {
        let strategy = Linear::new().jitter(false).scale_factor(0.01);
        let started = Instant::now();
        delay(&strategy, 3).await;
        assert!(started.elapsed() >= Duration::from_millis(30));
    }
}
