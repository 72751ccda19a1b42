//! Common test utilities and fixtures
//!
//! - `Reply` / `AttemptError` stamp every outcome with the attempt that produced it
//! - `scripted` builds a request that fails a fixed number of times
//! - `RecordingSleeper` captures backoff delays without waiting

#![allow(dead_code)]

use async_trait::async_trait;
use repeatable_request::error::Retryable;
use repeatable_request::retry::Sleeper;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Successful payload, tagged with the attempt that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub args: u32,
    pub try_num: u32,
    pub should_retry: bool,
}

impl Reply {
    pub fn new(args: u32, try_num: u32) -> Self {
        Self {
            args,
            try_num,
            should_retry: false,
        }
    }
}

/// Failure payload, tagged with the attempt that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptError {
    pub try_num: u32,
    pub retryable: bool,
}

impl AttemptError {
    pub fn retryable(try_num: u32) -> Self {
        Self {
            try_num,
            retryable: true,
        }
    }

    pub fn terminal(try_num: u32) -> Self {
        Self {
            try_num,
            retryable: false,
        }
    }
}

impl Retryable for AttemptError {
    fn is_retryable(&self) -> bool {
        self.retryable
    }
}

pub type Outcome = Result<Reply, AttemptError>;
pub type Attempt = Pin<Box<dyn Future<Output = Outcome> + Send>>;

/// A request whose first `failures` attempts return a retryable error.
///
/// Later attempts call `after(try_num, args)`. Every attempt yields to the
/// runtime once so outcomes arrive asynchronously.
pub fn scripted<F>(
    failures: u32,
    calls: Arc<AtomicU32>,
    after: F,
) -> impl Fn(u32) -> Attempt + Send + Sync + 'static
where
    F: Fn(u32, u32) -> Outcome + Send + Sync + 'static,
{
    let after = Arc::new(after);
    move |args| {
        let try_num = calls.fetch_add(1, Ordering::SeqCst);
        let after = Arc::clone(&after);
        Box::pin(async move {
            tokio::task::yield_now().await;
            if try_num < failures {
                Err(AttemptError::retryable(try_num))
            } else {
                after(try_num, args)
            }
        })
    }
}

/// `after` callback for `scripted` that succeeds.
pub fn succeed(try_num: u32, args: u32) -> Outcome {
    Ok(Reply::new(args, try_num))
}

/// Sleeper that records requested delays and returns immediately.
#[derive(Debug, Default, Clone)]
pub struct RecordingSleeper {
    delays: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, delay: Duration) {
        self.delays.lock().unwrap().push(delay);
    }
}
