//! Retry configuration: options, the validated policy, and per-call state.

use super::predicate::DefaultRetryable;
use super::sleep::{Sleeper, TokioSleeper};
use crate::error::{ConfigError, Result};
use crate::settings::RetrySettings;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Default maximum number of retries after the initial attempt.
pub const DEFAULT_RETRY_MAX_COUNT: u32 = 3;

/// Default lower bound (inclusive) of the backoff window, in milliseconds.
pub const DEFAULT_RETRY_BACKOFF_MIN_MS: i64 = 500;

/// Default upper bound (exclusive) of the backoff window, in milliseconds.
pub const DEFAULT_RETRY_BACKOFF_MAX_MS: i64 = 1000;

/// Window from which each retry delay is drawn uniformly at random.
///
/// # Formula
///
/// ```text
/// delta = end - start            (computed once)
/// delay = start + floor(random() * delta),  random() in [0, 1)
/// ```
///
/// For `end >= start` every delay lies in `[start, end)`. When `end < start`
/// the arithmetic is kept as is: delays land in `[end, start]` and may be
/// negative. A negative delay sleeps for zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffWindow {
    start_ms: i64,
    end_ms: i64,
    delta_ms: i64,
}

impl BackoffWindow {
    /// Create a window spanning `start_ms..end_ms`.
    pub fn new(start_ms: i64, end_ms: i64) -> Self {
        let delta_ms = end_ms.saturating_sub(start_ms);
        if delta_ms < 0 {
            warn!(start_ms, end_ms, "Backoff window ends before it starts");
        }
        Self {
            start_ms,
            end_ms,
            delta_ms,
        }
    }

    /// Lower bound of the window in milliseconds.
    pub fn start_ms(&self) -> i64 {
        self.start_ms
    }

    /// Upper bound of the window in milliseconds.
    pub fn end_ms(&self) -> i64 {
        self.end_ms
    }

    /// Span of the window, `end - start`, saturating at the `i64` bounds.
    /// Negative if the bounds were swapped.
    pub fn delta_ms(&self) -> i64 {
        self.delta_ms
    }

    /// Delay in milliseconds for a random `sample` in `[0, 1)`. Unclamped.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use repeatable_request::retry::BackoffWindow;
    ///
    /// let window = BackoffWindow::new(50, 100);
    /// assert_eq!(window.delay_millis(0.0), 50);
    /// assert_eq!(window.delay_millis(0.5), 75);
    /// assert_eq!(window.delay_millis(0.999), 99);
    /// ```
    pub fn delay_millis(&self, sample: f64) -> i64 {
        let offset = (sample * self.delta_ms as f64).floor() as i64;
        self.start_ms.saturating_add(offset)
    }

    /// Draw the next delay. Negative draws become a zero delay.
    pub fn next_delay(&self) -> Duration {
        let millis = self.delay_millis(rand::random::<f64>());
        Duration::from_millis(u64::try_from(millis).unwrap_or(0))
    }
}

impl Default for BackoffWindow {
    fn default() -> Self {
        Self {
            start_ms: DEFAULT_RETRY_BACKOFF_MIN_MS,
            end_ms: DEFAULT_RETRY_BACKOFF_MAX_MS,
            delta_ms: DEFAULT_RETRY_BACKOFF_MAX_MS - DEFAULT_RETRY_BACKOFF_MIN_MS,
        }
    }
}

/// Options for a retry sequence, validated by [`RetryOptions::build`].
///
/// Starts without a send operation, with the [`DefaultRetryable`]
/// predicate, a 500..1000 ms window and a budget of 3 retries.
///
/// # Examples
///
/// ```rust
/// use repeatable_request::error::RequestError;
/// use repeatable_request::retry::RetryOptions;
///
/// let policy = RetryOptions::new()
///     .send_request(|id: u64| async move { Ok::<_, RequestError>(id * 2) })
///     .backoff_range(50, 100)
///     .max_retry_count(5)
///     .build()
///     .unwrap();
///
/// assert_eq!(policy.max_retry_count(), 5);
/// assert_eq!(policy.backoff().delta_ms(), 50);
/// ```
pub struct RetryOptions<Op = (), P = DefaultRetryable> {
    send_request: Option<Op>,
    is_retryable: P,
    backoff: BackoffWindow,
    max_retry_count: u32,
    sleeper: Arc<dyn Sleeper>,
}

impl RetryOptions {
    /// Create options with every default and no send operation.
    pub fn new() -> Self {
        Self {
            send_request: None,
            is_retryable: DefaultRetryable,
            backoff: BackoffWindow::default(),
            max_retry_count: DEFAULT_RETRY_MAX_COUNT,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Seed options from loosely typed settings.
    ///
    /// The send operation still has to be supplied.
    pub fn from_settings(settings: &RetrySettings) -> Self {
        Self::new()
            .with_backoff(settings.backoff_window())
            .max_retry_count(settings.max_retry_count())
    }
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl<Op, P> RetryOptions<Op, P> {
    /// Set the operation performing one attempt.
    ///
    /// It receives a clone of the request arguments on every attempt.
    pub fn send_request<Op2>(self, send_request: Op2) -> RetryOptions<Op2, P> {
        RetryOptions {
            send_request: Some(send_request),
            is_retryable: self.is_retryable,
            backoff: self.backoff,
            max_retry_count: self.max_retry_count,
            sleeper: self.sleeper,
        }
    }

    /// Set or clear the operation, for callers that look it up at runtime.
    ///
    /// Passing `None` makes [`build`](Self::build) fail.
    pub fn with_send_request<Op2>(self, send_request: Option<Op2>) -> RetryOptions<Op2, P> {
        RetryOptions {
            send_request,
            is_retryable: self.is_retryable,
            backoff: self.backoff,
            max_retry_count: self.max_retry_count,
            sleeper: self.sleeper,
        }
    }

    /// Set the retryability predicate.
    pub fn is_retryable<P2>(self, predicate: P2) -> RetryOptions<Op, P2> {
        RetryOptions {
            send_request: self.send_request,
            is_retryable: predicate,
            backoff: self.backoff,
            max_retry_count: self.max_retry_count,
            sleeper: self.sleeper,
        }
    }

    /// Set the backoff window in milliseconds.
    ///
    /// Default: 500..1000
    pub fn backoff_range(self, start_ms: i64, end_ms: i64) -> Self {
        self.with_backoff(BackoffWindow::new(start_ms, end_ms))
    }

    /// Set the backoff window from an existing [`BackoffWindow`].
    pub fn with_backoff(mut self, backoff: BackoffWindow) -> Self {
        self.backoff = backoff;
        self
    }

    /// Set the maximum number of retries after the initial attempt.
    ///
    /// Zero disables retrying. Default: 3
    pub fn max_retry_count(mut self, max_retry_count: u32) -> Self {
        self.max_retry_count = max_retry_count;
        self
    }

    /// Replace the delay primitive.
    pub fn sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.sleeper = Arc::new(sleeper);
        self
    }

    /// Validate the options into an immutable [`RetryPolicy`].
    ///
    /// # Errors
    ///
    /// [`ConfigError::MissingSendRequest`] if no send operation was set.
    pub fn build(self) -> Result<RetryPolicy<Op, P>> {
        let send_request = self.send_request.ok_or(ConfigError::MissingSendRequest)?;
        Ok(RetryPolicy {
            send_request,
            is_retryable: self.is_retryable,
            backoff: self.backoff,
            max_retry_count: self.max_retry_count,
            sleeper: self.sleeper,
        })
    }
}

impl<Op, P> fmt::Debug for RetryOptions<Op, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryOptions")
            .field("send_request", &self.send_request.as_ref().map(|_| "<fn>"))
            .field("backoff", &self.backoff)
            .field("max_retry_count", &self.max_retry_count)
            .finish_non_exhaustive()
    }
}

/// A validated, immutable retry policy.
///
/// Run it with [`RetryPolicy::execute`]. Each call keeps its own
/// [`RetryState`], so one policy can drive any number of sequences.
pub struct RetryPolicy<Op, P = DefaultRetryable> {
    pub(super) send_request: Op,
    pub(super) is_retryable: P,
    pub(super) backoff: BackoffWindow,
    pub(super) max_retry_count: u32,
    pub(super) sleeper: Arc<dyn Sleeper>,
}

impl<Op, P> RetryPolicy<Op, P> {
    /// The backoff window.
    pub fn backoff(&self) -> BackoffWindow {
        self.backoff
    }

    /// The retry budget.
    pub fn max_retry_count(&self) -> u32 {
        self.max_retry_count
    }
}

impl<Op, P> fmt::Debug for RetryPolicy<Op, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("backoff", &self.backoff)
            .field("max_retry_count", &self.max_retry_count)
            .finish_non_exhaustive()
    }
}

/// Where a retry sequence currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPhase {
    /// An attempt is in flight.
    Attempting,
    /// Sleeping before the next attempt.
    WaitingToRetry,
    /// The final outcome has been delivered.
    Done,
}

/// Mutable bookkeeping for one retry sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryState {
    attempt_number: u32,
    phase: RetryPhase,
}

impl RetryState {
    /// Fresh state for the initial attempt.
    pub fn new() -> Self {
        Self {
            attempt_number: 0,
            phase: RetryPhase::Attempting,
        }
    }

    /// Zero-based index of the current attempt.
    pub fn attempt_number(&self) -> u32 {
        self.attempt_number
    }

    /// Current phase.
    pub fn phase(&self) -> RetryPhase {
        self.phase
    }

    /// Whether the budget allows another attempt.
    pub fn can_retry(&self, max_retry_count: u32) -> bool {
        self.phase == RetryPhase::Attempting && self.attempt_number < max_retry_count
    }

    pub(super) fn schedule_retry(&mut self) {
        debug_assert_eq!(self.phase, RetryPhase::Attempting);
        self.attempt_number += 1;
        self.phase = RetryPhase::WaitingToRetry;
    }

    pub(super) fn resume(&mut self) {
        debug_assert_eq!(self.phase, RetryPhase::WaitingToRetry);
        self.phase = RetryPhase::Attempting;
    }

    pub(super) fn finish(&mut self) {
        debug_assert_eq!(self.phase, RetryPhase::Attempting);
        self.phase = RetryPhase::Done;
    }
}

impl Default for RetryState {
    fn default() -> Self {
        Self::new()
    }
}
