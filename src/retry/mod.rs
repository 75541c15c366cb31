//! Retrying mutating calls through eventual-consistency windows.
//!
//! A just-created role or just-granted permission is often not yet visible
//! to the API that uses it. [`is_propagation_error`] recognises those
//! failures, and [`retry_until`] re-issues the call while they persist and
//! the budget allows. Retries wrap the call that *starts* an operation;
//! waiting for the operation to finish is the waiter's job and is never
//! retried here.

use std::error::Error;
use std::future::Future;
use std::time::Duration;

use backon::{BackoffBuilder, ExponentialBuilder};
use thiserror::Error;
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Error text fragments that indicate a propagation race rather than a
/// genuine failure.
pub const PROPAGATION_MARKERS: [&str; 5] = [
    "AccountGate check failed",
    "is not authorized",
    "role has insufficient",
    "role with trust relationship",
    "The security token included in the request is invalid",
];

/// Default propagation budget for a mutating call.
pub const DEFAULT_PROPAGATION_TIMEOUT: Duration = Duration::from_secs(120);
/// First sleep between attempts.
pub const DEFAULT_MIN_DELAY: Duration = Duration::from_millis(500);
/// Upper bound for the sleep between attempts.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(10);

/// Returns `true` when `message` contains a propagation marker.
#[must_use]
pub fn is_propagation_message(message: &str) -> bool {
    PROPAGATION_MARKERS
        .iter()
        .any(|marker| message.contains(marker))
}

/// Classifies an error (including its `source()` chain) as a propagation
/// race. `None` is never retryable.
#[must_use]
pub fn is_propagation_error(err: Option<&(dyn Error + 'static)>) -> bool {
    let mut current = err;
    while let Some(error) = current {
        if is_propagation_message(&error.to_string()) {
            return true;
        }
        current = error.source();
    }
    false
}

/// Timing for [`retry_until`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RetryPolicy {
    /// Total time allowed for retrying, measured from the first attempt.
    pub budget: Duration,
    /// First sleep between attempts.
    pub min_delay: Duration,
    /// Upper bound on the sleep between attempts.
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy with the default backoff bounds.
    #[must_use]
    pub const fn new(budget: Duration) -> Self {
        Self {
            budget,
            min_delay: DEFAULT_MIN_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_PROPAGATION_TIMEOUT)
    }
}

/// Errors returned by [`retry_until`].
#[derive(Debug, Error)]
pub enum RetryError<E>
where
    E: Error + 'static,
{
    /// The operation failed with an error the classifier rejected.
    #[error(transparent)]
    Permanent(E),
    /// The budget ran out while the error was still classified retryable.
    #[error("retry budget exhausted after {attempts} attempts")]
    TimedOut {
        /// Number of attempts made.
        attempts: u32,
        /// Error returned by the final attempt.
        #[source]
        last: E,
    },
    /// The caller cancelled while an attempt or backoff was in flight.
    #[error("retry cancelled after {attempts} attempts")]
    Cancelled {
        /// Number of attempts that completed before cancellation.
        attempts: u32,
    },
}

impl<E> RetryError<E>
where
    E: Error + 'static,
{
    /// Returns the operation's own error, if one was recorded.
    #[must_use]
    pub fn into_inner(self) -> Option<E> {
        match self {
            Self::Permanent(err) | Self::TimedOut { last: err, .. } => Some(err),
            Self::Cancelled { .. } => None,
        }
    }
}

/// Invokes `factory` until it succeeds, fails permanently, or the budget
/// runs out.
///
/// `factory` receives the 1-based attempt number and must build a fresh
/// request each time, including a new [`crate::OperationToken`]; reusing a
/// token makes the backend treat the retry as a duplicate of the failed
/// call.
///
/// # Errors
///
/// Returns [`RetryError::Permanent`] for errors `classify` rejects,
/// [`RetryError::TimedOut`] when retryable errors outlast the budget, and
/// [`RetryError::Cancelled`] when `cancel` fires.
pub async fn retry_until<T, E, F, Fut, C>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    classify: C,
    mut factory: F,
) -> Result<T, RetryError<E>>
where
    E: Error + 'static,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    C: Fn(&E) -> bool,
{
    let deadline = Instant::now() + policy.budget;
    let mut backoff = ExponentialBuilder::default()
        .with_min_delay(policy.min_delay)
        .with_max_delay(policy.max_delay)
        .with_factor(2.0)
        .with_max_times(usize::MAX)
        .build();
    let mut attempts: u32 = 0;

    loop {
        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(RetryError::Cancelled { attempts }),
            result = factory(attempts + 1) => result,
        };
        attempts += 1;

        let err = match result {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if !classify(&err) {
            return Err(RetryError::Permanent(err));
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(RetryError::TimedOut {
                attempts,
                last: err,
            });
        }

        let delay = backoff.next().unwrap_or(policy.max_delay).min(remaining);
        warn!(attempts, ?delay, error = %err, "retrying after propagation error");
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(RetryError::Cancelled { attempts }),
            () = sleep(delay) => {}
        }
    }
}
