//! # Backoff Utils
//!
//! Retry operations that may fail, waiting between attempts according to a pluggable backoff
//! strategy.
//!
//! A [`Backoff`] re-invokes an operation until it succeeds, fails with an error that is not in
//! its [`Catch`] set, runs out of tries, or passes its wall-clock deadline. The terminal failure
//! is raised unchanged, replaced by a substitute error, or handed to a callback, as configured
//! by [`OnFailure`].
//!
//! ## Features
//!
//! - Blocking retries through [`Backoff::execute`], [`Backoff::execute_with`] and
//!   [`Backoff::wrap`] (the `sync` module)
//! - Asynchronous retries through [`Backoff::execute_async`] (the `unsync` module)
//! - Exponential, fibonacci, fixed-sequence, linear and polynomial strategies, with optional
//!   jitter and a scale factor, in the [`strategy`] module
//!
//! ## Usage Examples
//!
//! ### Synchronous Usage
//!
//! ```rust
//! use backoff_utils::Backoff;
//! use backoff_utils::strategy::Exponential;
//!
//! // Retry an operation with exponential backoff
//! let result = Backoff::new()
//!     .strategy(Exponential::new().scale_factor(0.01))
//!     .max_tries(3)
//!     .execute(|| {
//!         // Your fallible operation here
//!         if some_condition() {
//!             Ok("success")
//!         } else {
//!             Err("failure")
//!         }
//!     });
//!
//! # fn some_condition() -> bool { true }
//! assert_eq!(result.unwrap(), Some("success"));
//! ```
//!
//! ### Asynchronous Usage
//!
//! ```rust
//! use backoff_utils::Backoff;
//! use backoff_utils::strategy::Fibonacci;
//! use std::sync::{Arc, Mutex};
//!
//! async fn example() -> Option<&'static str> {
//!     let attempts = Arc::new(Mutex::new(0));
//!     let attempts_clone = attempts.clone();
//!     Backoff::new()
//!         .strategy(Fibonacci::new().scale_factor(0.01))
//!         .execute_async(|| {
//!             let value = attempts_clone.clone();
//!             async move {
//!                 let mut lock = value.lock().unwrap();
//!                 *lock += 1;
//!                 if *lock < 2 {
//!                     Err("Error")
//!                 } else {
//!                     Ok("Success")
//!                 }
//!             }
//!         })
//!         .await
//!         .ok()
//!         .flatten()
//! }
//! ```
//!
//! ## Defaults
//!
//! Unless set on the [`Backoff`], the try count and deadline come from a [`BackoffConfig`],
//! which can be read from the `BACKOFF_DEFAULT_TRIES` and `BACKOFF_DEFAULT_DELAY` environment
//! variables with [`BackoffConfig::from_env`].
//!
//! ## Feature Flags
//!
//! - `serde`: derives `Serialize`/`Deserialize` for the configuration types
//!
//! ## Acknowledgment to the following projects
//! <https://github.com/jimmycuadra/retry>
pub mod strategy;
pub mod sync;
pub mod unsync;

mod backoff;
mod config;
mod error;
mod handler;

pub use backoff::{Backoff, Invocation};
pub use config::{BackoffConfig, ENV_DEFAULT_DELAY, ENV_DEFAULT_TRIES};
pub use error::{BackoffError, BackoffResult, HandlerError, InvalidArgument};
pub use handler::{Catch, OnFailure, OnSuccess};
