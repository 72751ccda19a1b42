//! Example: Retrying an unreliable request
//!
//! This example demonstrates:
//! 1. Default retryable marker with a custom backoff window
//! 2. Custom retry predicate over the success payload
//! 3. Callback-style entry point with `run`
//! 4. Spread of delays drawn from the backoff window
//!
//! Run with:
//! ```bash
//! RUST_LOG=repeatable_request=debug cargo run -p repeatable-request --example retry_example
//! ```

use repeatable_request::prelude::*;
use std::error::Error;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// A simulated API that fails the first few times
struct UnreliableApi {
    attempts: Arc<AtomicU32>,
    fail_count: u32,
}

impl UnreliableApi {
    fn new(fail_count: u32) -> Self {
        Self {
            attempts: Arc::new(AtomicU32::new(0)),
            fail_count,
        }
    }

    async fn call(&self, path: &str) -> Result<String, RequestError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);

        if attempt < self.fail_count {
            println!("  Attempt {}: FAILED (transient)", attempt + 1);
            Err(RequestError::retryable(format!(
                "{path} unavailable on attempt {}",
                attempt + 1
            )))
        } else {
            println!("  Attempt {}: SUCCESS", attempt + 1);
            Ok(format!("{path}: ok"))
        }
    }

    fn total_attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

/// Example 1: Retry errors marked as retryable
async fn example_marked_errors() -> Result<(), Box<dyn Error>> {
    println!("\n=== Example 1: Retryable Errors ===\n");

    let api = UnreliableApi::new(2);
    let policy = RetryOptions::new()
        .send_request(|path: &'static str| {
            let api = &api;
            async move { api.call(path).await }
        })
        .backoff_range(50, 100)
        .max_retry_count(5)
        .build()?;

    let start = Instant::now();
    let body = policy.execute("/status").await?;

    println!("\nResult: {}", body);
    println!("Total attempts: {}", api.total_attempts());
    println!("Total time: {:?} (two delays of 50-100ms)", start.elapsed());

    Ok(())
}

/// A job that reports whether it is still running
#[derive(Debug)]
struct JobStatus {
    polls: u32,
    pending: bool,
}

/// Example 2: Poll until the payload says we are done
async fn example_custom_predicate() -> Result<(), Box<dyn Error>> {
    println!("\n=== Example 2: Custom Predicate (Poll Until Done) ===\n");

    let polls = Arc::new(AtomicU32::new(0));
    let policy = RetryOptions::new()
        .send_request(|job_id: u64| {
            let polls = Arc::clone(&polls);
            async move {
                let n = polls.fetch_add(1, Ordering::SeqCst) + 1;
                println!("  Polling job {job_id} (poll {n})");
                Ok::<_, RequestError>(JobStatus {
                    polls: n,
                    pending: n < 3,
                })
            }
        })
        .is_retryable(|outcome: &Result<JobStatus, RequestError>| {
            matches!(outcome, Ok(status) if status.pending)
        })
        .backoff_range(20, 40)
        .max_retry_count(10)
        .build()?;

    let status = policy.execute(7).await?;
    println!("\nJob finished after {} polls: {:?}", status.polls, status);

    Ok(())
}

/// Example 3: Callback-style entry point
async fn example_run() -> Result<(), Box<dyn Error>> {
    println!("\n=== Example 3: run() With a Completion Callback ===\n");

    let api = Arc::new(UnreliableApi::new(1));
    let api_clone = Arc::clone(&api);
    let (tx, rx) = tokio::sync::oneshot::channel();

    run(
        RetryOptions::new()
            .send_request(move |path: &'static str| {
                let api = Arc::clone(&api_clone);
                async move { api.call(path).await }
            })
            .backoff_range(10, 20),
        "/health",
        move |outcome| {
            println!("  on_done: {:?}", outcome);
            let _ = tx.send(outcome);
        },
    )?;

    let outcome = rx.await?;
    println!("\nFinal outcome: {:?}", outcome);
    println!("Total attempts: {}", api.total_attempts());

    // Configuration errors surface before anything runs
    let missing = RetryOptions::new().build();
    println!("Without a send operation: {:?}", missing.err());

    Ok(())
}

/// Example 4: Delay spread
fn example_delay_spread() {
    println!("\n=== Example 4: Backoff Window Spread (10 Draws) ===\n");

    let window = BackoffWindow::default();
    let delays: Vec<u128> = (0..10).map(|_| window.next_delay().as_millis()).collect();

    println!("  Window: {}..{}ms", window.start_ms(), window.end_ms());
    println!("  Draws:  {:?}", delays);

    let avg = delays.iter().sum::<u128>() as f64 / delays.len() as f64;
    println!("  Average: {:.1}ms (expect ~750ms)", avg);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("==============================================");
    println!("   repeatable-request: Retry Examples");
    println!("==============================================");

    example_marked_errors().await?;
    example_custom_predicate().await?;
    example_run().await?;
    example_delay_spread();

    println!("\n==============================================");
    println!("   All examples completed successfully!");
    println!("==============================================\n");

    Ok(())
}
