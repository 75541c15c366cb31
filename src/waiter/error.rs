//! Error types for the waiter.

use std::time::Duration;

use thiserror::Error;

use crate::probe::ProbeError;

/// Errors that end a wait without a settled outcome.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum WaitError {
    /// The resource stayed absent for longer than `not_found_tolerance` allows.
    #[error("resource not found after {checks} consecutive checks")]
    NotFound {
        /// Number of consecutive absences observed.
        checks: u32,
        /// Message from the last not-found error, if the probe returned one.
        message: Option<String>,
    },
    /// The describe call failed for a reason other than absence.
    #[error(transparent)]
    Probe(#[from] ProbeError),
    /// The deadline passed while the status was still pending.
    #[error(
        "timeout after {timeout:?} waiting for {} (last status: {})",
        expected_text(.expected),
        .last_status.as_deref().unwrap_or("none")
    )]
    TimedOut {
        /// Deadline that elapsed.
        timeout: Duration,
        /// Last status observed before the deadline, if any.
        last_status: Option<String>,
        /// Target statuses being waited for; empty when waiting for absence.
        expected: Vec<String>,
    },
    /// The caller cancelled the wait.
    #[error("wait cancelled (last status: {})", .last_status.as_deref().unwrap_or("none"))]
    Cancelled {
        /// Last status observed before cancellation, if any.
        last_status: Option<String>,
    },
}

impl WaitError {
    /// Returns `true` for [`WaitError::NotFound`] so delete handlers can
    /// treat the resource as already gone.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` for [`WaitError::TimedOut`].
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }
}

fn expected_text(expected: &[String]) -> String {
    if expected.is_empty() {
        String::from("resource to be gone")
    } else {
        format!("status [{}]", expected.join(", "))
    }
}
