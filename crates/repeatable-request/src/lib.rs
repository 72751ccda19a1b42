#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Retry an asynchronous request with a randomized backoff.
//!
//! The request itself is yours: any `Fn(args) -> Future<Output = Result<T, E>>`.
//! This crate decides, after every attempt, whether to try again:
//!
//! - **Retryability predicate** inspects the whole outcome (`Ok` or `Err`).
//!   The default retries errors carrying the [`Retryable`](error::Retryable) marker.
//! - **Backoff window** draws each delay uniformly from `[start, end)` ms
//!   (default 500..1000).
//! - **Retry budget** caps retries after the first attempt (default 3).
//!
//! The final outcome is returned exactly as the last attempt produced it.
//!
//! # Examples
//!
//! Using the prelude for convenient imports:
//!
//! ```rust
//! use repeatable_request::prelude::*;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let policy = RetryOptions::new()
//!     .send_request(|id: u64| async move {
//!         if id == 0 {
//!             Err(RequestError::terminal("no such record"))
//!         } else {
//!             Ok(id)
//!         }
//!     })
//!     .max_retry_count(3)
//!     .build()?;
//!
//! let id = policy.execute(7).await?;
//! # Ok(())
//! # }
//! ```
//!
//! Loading settings from the environment:
//!
//! ```rust
//! use repeatable_request::prelude::*;
//!
//! let options = RetryOptions::from_settings(&RetrySettings::from_env());
//! ```

pub mod error;
pub mod retry;
pub mod settings;

/// Convenient re-exports of commonly used items.
///
/// Import everything with:
///
/// ```rust
/// use repeatable_request::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{ConfigError, RequestError, Retryable};
    pub use crate::retry::{
        BackoffWindow, DefaultRetryable, RetryOptions, RetryPolicy, RetryPredicate, Sleeper,
        TokioSleeper, run,
    };
    pub use crate::settings::RetrySettings;
}
