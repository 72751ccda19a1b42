//! The retry control loop.

use super::policy::{RetryOptions, RetryPolicy, RetryState};
use super::predicate::RetryPredicate;
use crate::error::Result;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

impl<Op, P> RetryPolicy<Op, P> {
    /// Run the request until it yields a non-retryable outcome or the retry
    /// budget is spent, and return that last outcome unchanged.
    ///
    /// Each attempt gets a clone of `args`. Attempts never overlap: the next
    /// one starts only after the previous outcome has been inspected and
    /// the backoff delay has elapsed. The operation is called between 1 and
    /// `max_retry_count + 1` times.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use repeatable_request::error::RequestError;
    /// use repeatable_request::retry::RetryOptions;
    /// use std::sync::Arc;
    /// use std::sync::atomic::{AtomicU32, Ordering};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let calls = Arc::new(AtomicU32::new(0));
    /// let policy = RetryOptions::new()
    ///     .send_request(|name: String| {
    ///         let calls = Arc::clone(&calls);
    ///         async move {
    ///             if calls.fetch_add(1, Ordering::SeqCst) < 2 {
    ///                 Err(RequestError::retryable("busy"))
    ///             } else {
    ///                 Ok(format!("hello {name}"))
    ///             }
    ///         }
    ///     })
    ///     .backoff_range(10, 20)
    ///     .build()?;
    ///
    /// let greeting = policy.execute("world".to_string()).await?;
    /// assert_eq!(greeting, "hello world");
    /// # Ok(())
    /// # }
    /// ```
    pub async fn execute<A, Fut, T, E>(&self, args: A) -> std::result::Result<T, E>
    where
        Op: Fn(A) -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        A: Clone,
        P: RetryPredicate<T, E>,
    {
        let mut state = RetryState::new();
        loop {
            debug!(
                attempt = state.attempt_number(),
                max_retry_count = self.max_retry_count,
                "Sending request"
            );
            let outcome = (self.send_request)(args.clone()).await;

            // Strict: the predicate must say `true` and budget must remain
            if self.is_retryable.is_retryable(&outcome)
                && state.can_retry(self.max_retry_count)
            {
                drop(outcome);
                state.schedule_retry();
                let delay = self.backoff.next_delay();
                debug!(
                    attempt = state.attempt_number(),
                    delay_ms = saturating_millis(delay),
                    "Retrying request after backoff"
                );
                self.sleeper.sleep(delay).await;
                state.resume();
                continue;
            }

            state.finish();
            debug!(
                attempts = state.attempt_number() + 1,
                retried = state.attempt_number() > 0,
                succeeded = outcome.is_ok(),
                "Request sequence finished"
            );
            return outcome;
        }
    }
}

/// Whole milliseconds of `delay` for log fields, capped at `u64::MAX`.
fn saturating_millis(delay: Duration) -> u64 {
    u64::try_from(delay.as_millis()).unwrap_or(u64::MAX)
}

/// Validate `options`, then retry the request in the background and hand
/// the final outcome to `on_done`.
///
/// Configuration errors are returned synchronously, before `args` is used
/// and without ever calling `on_done`. Otherwise the sequence is spawned on
/// the current tokio runtime and `on_done` runs exactly once when it ends.
///
/// # Panics
///
/// Panics if called outside a tokio runtime. Without one, use
/// [`RetryOptions::build`] and drive [`RetryPolicy::execute`] yourself.
///
/// # Examples
///
/// ```rust
/// use repeatable_request::error::RequestError;
/// use repeatable_request::retry::{RetryOptions, run};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (tx, rx) = tokio::sync::oneshot::channel();
///
/// run(
///     RetryOptions::new()
///         .send_request(|n: u32| async move { Ok::<_, RequestError>(n + 1) }),
///     41,
///     move |outcome| {
///         let _ = tx.send(outcome);
///     },
/// )?;
///
/// assert_eq!(rx.await?, Ok(42));
/// # Ok(())
/// # }
/// ```
pub fn run<Op, P, A, Fut, T, E, D>(
    options: RetryOptions<Op, P>,
    args: A,
    on_done: D,
) -> Result<JoinHandle<()>>
where
    Op: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = std::result::Result<T, E>> + Send,
    A: Clone + Send + Sync + 'static,
    P: RetryPredicate<T, E> + 'static,
    T: Send + 'static,
    E: Send + 'static,
    D: FnOnce(std::result::Result<T, E>) + Send + 'static,
{
    let policy = options.build()?;
    Ok(tokio::spawn(async move {
        let outcome = policy.execute(args).await;
        on_done(outcome);
    }))
}
