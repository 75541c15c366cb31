//! Per-call waiter parameters.

use std::collections::BTreeSet;
use std::time::Duration;

use thiserror::Error;

/// Default number of consecutive absences tolerated before giving up.
pub const DEFAULT_NOT_FOUND_TOLERANCE: u32 = 20;

/// Parameters for one wait. Built fresh per call and never mutated.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WaiterSpec {
    pending: BTreeSet<String>,
    target: BTreeSet<String>,
    timeout: Duration,
    min_poll_interval: Duration,
    poll_interval: Option<Duration>,
    initial_delay: Duration,
    continuous_target_occurrences: u32,
    not_found_tolerance: u32,
}

impl WaiterSpec {
    /// Starts a builder with the given deadline.
    #[must_use]
    pub fn builder(timeout: Duration) -> WaiterSpecBuilder {
        WaiterSpecBuilder::new(timeout)
    }

    /// Statuses meaning "still in progress".
    #[must_use]
    pub const fn pending(&self) -> &BTreeSet<String> {
        &self.pending
    }

    /// Statuses meaning "finished as requested". Empty means "wait until gone".
    #[must_use]
    pub const fn target(&self) -> &BTreeSet<String> {
        &self.target
    }

    /// Overall deadline measured from the start of the wait.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Lower bound applied to every sleep between polls.
    #[must_use]
    pub const fn min_poll_interval(&self) -> Duration {
        self.min_poll_interval
    }

    /// Fixed poll interval replacing the backoff schedule, if set.
    #[must_use]
    pub const fn poll_interval(&self) -> Option<Duration> {
        self.poll_interval
    }

    /// Sleep before the first poll.
    #[must_use]
    pub const fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    /// Consecutive target observations required before settling.
    #[must_use]
    pub const fn continuous_target_occurrences(&self) -> u32 {
        self.continuous_target_occurrences
    }

    /// Consecutive absences tolerated before failing with not-found.
    #[must_use]
    pub const fn not_found_tolerance(&self) -> u32 {
        self.not_found_tolerance
    }

    /// Returns `true` when `status` is a pending status.
    #[must_use]
    pub fn is_pending(&self, status: &str) -> bool {
        self.pending.contains(status)
    }

    /// Returns `true` when `status` is a target status.
    #[must_use]
    pub fn is_target(&self, status: &str) -> bool {
        self.target.contains(status)
    }

    /// Returns `true` when absence is the requested outcome.
    #[must_use]
    pub fn waits_for_absence(&self) -> bool {
        self.target.is_empty()
    }
}

/// Builder for [`WaiterSpec`] that validates on [`WaiterSpecBuilder::build`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WaiterSpecBuilder {
    pending: BTreeSet<String>,
    target: BTreeSet<String>,
    timeout: Duration,
    min_poll_interval: Duration,
    poll_interval: Option<Duration>,
    initial_delay: Duration,
    continuous_target_occurrences: u32,
    not_found_tolerance: u32,
}

impl WaiterSpecBuilder {
    /// Creates a builder with default timing and empty status sets.
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self {
            pending: BTreeSet::new(),
            target: BTreeSet::new(),
            timeout,
            min_poll_interval: Duration::ZERO,
            poll_interval: None,
            initial_delay: Duration::ZERO,
            continuous_target_occurrences: 1,
            not_found_tolerance: DEFAULT_NOT_FOUND_TOLERANCE,
        }
    }

    /// Sets the pending statuses.
    #[must_use]
    pub fn pending<I, T>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.pending = statuses.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the target statuses.
    #[must_use]
    pub fn target<I, T>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.target = statuses.into_iter().map(Into::into).collect();
        self
    }

    /// Overrides the deadline.
    #[must_use]
    pub const fn timeout(mut self, value: Duration) -> Self {
        self.timeout = value;
        self
    }

    /// Sets the minimum sleep between polls.
    #[must_use]
    pub const fn min_poll_interval(mut self, value: Duration) -> Self {
        self.min_poll_interval = value;
        self
    }

    /// Replaces the backoff schedule with a fixed interval. A zero interval
    /// leaves the backoff schedule in place.
    #[must_use]
    pub const fn poll_interval(mut self, value: Option<Duration>) -> Self {
        self.poll_interval = value;
        self
    }

    /// Sets the sleep before the first poll.
    #[must_use]
    pub const fn initial_delay(mut self, value: Duration) -> Self {
        self.initial_delay = value;
        self
    }

    /// Sets how many consecutive target observations are required.
    #[must_use]
    pub const fn continuous_target_occurrences(mut self, value: u32) -> Self {
        self.continuous_target_occurrences = value;
        self
    }

    /// Sets how many consecutive absences are tolerated.
    #[must_use]
    pub const fn not_found_tolerance(mut self, value: u32) -> Self {
        self.not_found_tolerance = value;
        self
    }

    /// Validates and builds the [`WaiterSpec`].
    ///
    /// # Errors
    ///
    /// Returns [`SpecError`] when the deadline is zero, no target occurrence
    /// is required, or a status is both pending and target.
    pub fn build(self) -> Result<WaiterSpec, SpecError> {
        if self.timeout.is_zero() {
            return Err(SpecError::ZeroTimeout);
        }
        if self.continuous_target_occurrences == 0 {
            return Err(SpecError::ZeroTargetOccurrences);
        }
        if let Some(status) = self.pending.intersection(&self.target).next() {
            return Err(SpecError::OverlappingStatus {
                status: status.clone(),
            });
        }
        Ok(WaiterSpec {
            pending: self.pending,
            target: self.target,
            timeout: self.timeout,
            min_poll_interval: self.min_poll_interval,
            poll_interval: self.poll_interval.filter(|interval| !interval.is_zero()),
            initial_delay: self.initial_delay,
            continuous_target_occurrences: self.continuous_target_occurrences,
            not_found_tolerance: self.not_found_tolerance,
        })
    }
}

/// Errors raised when a [`WaiterSpec`] is inconsistent.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum SpecError {
    /// The deadline was zero.
    #[error("waiter timeout must be greater than zero")]
    ZeroTimeout,
    /// `continuous_target_occurrences` was zero.
    #[error("continuous target occurrences must be at least 1")]
    ZeroTargetOccurrences,
    /// A status appeared in both the pending and the target set.
    #[error("status {status} cannot be both pending and target")]
    OverlappingStatus {
        /// Status present in both sets.
        status: String,
    },
}
