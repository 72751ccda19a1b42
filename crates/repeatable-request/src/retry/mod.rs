//! Retry policy and executor.
//!
//! # Key Types
//!
//! - [`RetryOptions`] - Builder validated into a [`RetryPolicy`]
//! - [`RetryPolicy`] - Immutable policy; [`RetryPolicy::execute`] runs the loop
//! - [`BackoffWindow`] - Uniformly random delay window
//! - [`RetryPredicate`] - Decides whether an outcome is retried
//! - [`Sleeper`] - Delay primitive between attempts
//!
//! # Examples
//!
//! ```rust
//! use repeatable_request::error::RequestError;
//! use repeatable_request::retry::RetryOptions;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let policy = RetryOptions::new()
//!     .send_request(|path: &'static str| async move {
//!         // Your request here
//!         Ok::<_, RequestError>(path.len())
//!     })
//!     .backoff_range(50, 100)
//!     .max_retry_count(5)
//!     .build()?;
//!
//! let len = policy.execute("/status").await?;
//! # Ok(())
//! # }
//! ```

mod executor;
mod policy;
mod predicate;
mod sleep;

pub use executor::run;
pub use policy::{
    BackoffWindow, DEFAULT_RETRY_BACKOFF_MAX_MS, DEFAULT_RETRY_BACKOFF_MIN_MS,
    DEFAULT_RETRY_MAX_COUNT, RetryOptions, RetryPhase, RetryPolicy, RetryState,
};
pub use predicate::{DefaultRetryable, RetryPredicate};
pub use sleep::{Sleeper, TokioSleeper};
