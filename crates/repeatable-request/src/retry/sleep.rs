//! Delay primitive used between attempts.

use async_trait::async_trait;
use std::time::Duration;

/// Suspends a retry sequence for the backoff delay.
///
/// The default [`TokioSleeper`] parks the task on the tokio timer, leaving
/// the runtime free to drive other work. Swap it out to observe or skip the
/// delays, for example in tests.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Wait for `delay` before the next attempt.
    async fn sleep(&self, delay: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}
