//! Error types for configuring a retry sequence.
//!
//! Only configuration can fail on its own. Whatever the wrapped operation
//! reports is the caller's error type and is passed through untouched.

use std::io;
use thiserror::Error;

/// Result type alias for configuration steps.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Configuration errors, raised synchronously before any attempt is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// No operation was supplied to perform the request.
    #[error("send_request is not a function")]
    MissingSendRequest,
}

/// Marker carried by errors that know whether they are worth retrying.
///
/// The default retry predicate retries an `Err` outcome only when its error
/// reports `true` here.
///
/// # Examples
///
/// ```rust
/// use repeatable_request::error::Retryable;
///
/// #[derive(Debug)]
/// enum FetchError {
///     Busy,
///     NotFound,
/// }
///
/// impl Retryable for FetchError {
///     fn is_retryable(&self) -> bool {
///         matches!(self, FetchError::Busy)
///     }
/// }
///
/// assert!(FetchError::Busy.is_retryable());
/// assert!(!FetchError::NotFound.is_retryable());
/// ```
pub trait Retryable {
    /// Whether another attempt might succeed.
    fn is_retryable(&self) -> bool;
}

impl<T: Retryable + ?Sized> Retryable for &T {
    fn is_retryable(&self) -> bool {
        (**self).is_retryable()
    }
}

impl<T: Retryable + ?Sized> Retryable for Box<T> {
    fn is_retryable(&self) -> bool {
        (**self).is_retryable()
    }
}

impl Retryable for io::Error {
    fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            io::ErrorKind::Interrupted
                | io::ErrorKind::TimedOut
                | io::ErrorKind::WouldBlock
                | io::ErrorKind::ConnectionReset
                | io::ErrorKind::ConnectionAborted
        )
    }
}

/// A request failure with an explicit retryable flag.
///
/// Handy for operations that have no error type of their own.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RequestError {
    message: String,
    retryable: bool,
}

impl RequestError {
    /// A failure that should be retried.
    pub fn retryable(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: true,
        }
    }

    /// A failure that should be reported immediately.
    pub fn terminal(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: false,
        }
    }

    /// The failure message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Retryable for RequestError {
    fn is_retryable(&self) -> bool {
        self.retryable
    }
}
