//! Retryability predicates.

use crate::error::Retryable;

/// Decides whether an attempt's outcome warrants another attempt.
///
/// The predicate sees the whole outcome, so it can retry on a failure
/// payload, a success payload, or both. Only `true` schedules a retry;
/// the retry budget is checked separately by the executor.
///
/// Any `Fn(&Result<T, E>) -> bool` closure is a predicate. Annotate the
/// argument type so the closure is general over the borrow:
///
/// ```rust
/// use repeatable_request::retry::RetryPredicate;
///
/// struct Reply {
///     should_retry: bool,
/// }
///
/// let predicate = |outcome: &Result<Reply, std::io::Error>| {
///     matches!(outcome, Ok(reply) if reply.should_retry)
/// };
///
/// assert!(predicate.is_retryable(&Ok(Reply { should_retry: true })));
/// assert!(!predicate.is_retryable(&Err(std::io::Error::other("down"))));
/// ```
pub trait RetryPredicate<T, E>: Send + Sync {
    /// Return `true` to request another attempt.
    fn is_retryable(&self, outcome: &Result<T, E>) -> bool;
}

impl<T, E, F> RetryPredicate<T, E> for F
where
    F: Fn(&Result<T, E>) -> bool + Send + Sync,
{
    fn is_retryable(&self, outcome: &Result<T, E>) -> bool {
        self(outcome)
    }
}

/// The default predicate: retry failures whose error carries the
/// [`Retryable`] marker. Successes are never retried.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRetryable;

impl<T, E: Retryable> RetryPredicate<T, E> for DefaultRetryable {
    fn is_retryable(&self, outcome: &Result<T, E>) -> bool {
        match outcome {
            Ok(_) => false,
            Err(err) => err.is_retryable(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RequestError;

    #[test]
    fn test_default_retries_marked_errors_only() {
        let retryable: Result<u32, _> = Err(RequestError::retryable("busy"));
        let terminal: Result<u32, _> = Err(RequestError::terminal("bad input"));
        let success: Result<u32, RequestError> = Ok(7);

        assert!(DefaultRetryable.is_retryable(&retryable));
        assert!(!DefaultRetryable.is_retryable(&terminal));
        assert!(!DefaultRetryable.is_retryable(&success));
    }

    #[test]
    fn test_default_with_io_errors() {
        let timed_out: Result<(), std::io::Error> =
            Err(std::io::ErrorKind::TimedOut.into());
        let denied: Result<(), std::io::Error> =
            Err(std::io::ErrorKind::PermissionDenied.into());

        assert!(DefaultRetryable.is_retryable(&timed_out));
        assert!(!DefaultRetryable.is_retryable(&denied));
    }

    #[test]
    fn test_closure_sees_success_payload() {
        let predicate = |outcome: &Result<Option<u32>, RequestError>| {
            matches!(outcome, Ok(None))
        };

        assert!(predicate.is_retryable(&Ok(None)));
        assert!(!predicate.is_retryable(&Ok(Some(1))));
        assert!(!predicate.is_retryable(&Err(RequestError::retryable("busy"))));
    }
}
