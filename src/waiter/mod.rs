//! Poll-based state-change waiter.
//!
//! [`wait`] repeatedly describes a resource until its status leaves the
//! pending set. Reaching a target status (for the configured number of
//! consecutive polls) settles with [`WaitOutcome::Reached`]; any status that
//! is neither pending nor target settles with [`WaitOutcome::Unexpected`] so
//! the caller can run failure diagnosis. Absence is tolerated up to
//! `not_found_tolerance`, or is itself the goal when the target set is empty.
//!
//! Polls are strictly sequential. The only suspension points are the sleeps
//! between polls and the in-flight describe call; both race the caller's
//! [`CancellationToken`].

mod error;
mod spec;

use std::time::Duration;

use backon::{BackoffBuilder, ExponentialBackoff, ExponentialBuilder};
use tokio::time::{Instant, sleep, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::probe::{Observation, ProbeError, StatusProbe};

pub use error::WaitError;
pub use spec::{DEFAULT_NOT_FOUND_TOLERANCE, SpecError, WaiterSpec, WaiterSpecBuilder};

/// First sleep of the backoff schedule.
pub const INITIAL_BACKOFF: Duration = Duration::from_millis(100);
/// Upper bound of the backoff schedule.
pub const MAX_BACKOFF: Duration = Duration::from_secs(10);

/// How a wait settled.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum WaitOutcome<S> {
    /// A target status was observed often enough in a row.
    Reached(Observation<S>),
    /// A status outside both sets ended the wait; diagnosis should follow.
    Unexpected(Observation<S>),
    /// The resource is absent and absence was requested.
    Gone,
}

impl<S> WaitOutcome<S> {
    /// Returns the settled status, if the resource was still present.
    #[must_use]
    pub fn status(&self) -> Option<&str> {
        match self {
            Self::Reached(obs) | Self::Unexpected(obs) => Some(obs.status.as_str()),
            Self::Gone => None,
        }
    }

    /// Returns `true` when the requested outcome was reached.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Reached(_) | Self::Gone)
    }

    /// Consumes the outcome and returns the last observation, if any.
    #[must_use]
    pub fn into_observation(self) -> Option<Observation<S>> {
        match self {
            Self::Reached(obs) | Self::Unexpected(obs) => Some(obs),
            Self::Gone => None,
        }
    }
}

/// Polls `probe` until the operation settles or the wait is abandoned.
///
/// # Errors
///
/// Returns [`WaitError::Probe`] for describe failures other than absence,
/// [`WaitError::NotFound`] when absence outlasts the tolerance,
/// [`WaitError::TimedOut`] when the deadline passes, and
/// [`WaitError::Cancelled`] when `cancel` fires.
pub async fn wait<P>(
    probe: &P,
    spec: &WaiterSpec,
    cancel: &CancellationToken,
) -> Result<WaitOutcome<P::State>, WaitError>
where
    P: StatusProbe + ?Sized,
{
    let deadline = Instant::now() + spec.timeout();
    let mut tracker = Tracker::default();
    let mut schedule = PollSchedule::new(spec);

    pause(spec.initial_delay(), deadline, cancel, &tracker).await?;

    loop {
        if Instant::now() >= deadline {
            return Err(tracker.timed_out(spec));
        }

        let observed = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(tracker.cancelled()),
            result = probe.describe() => result,
            () = sleep_until(deadline) => return Err(tracker.timed_out(spec)),
        };

        if let Step::Settled(outcome) = tracker.record(spec, observed)? {
            info!(
                status = outcome.status().unwrap_or("absent"),
                polls = tracker.polls,
                "wait settled"
            );
            return Ok(outcome);
        }

        let delay = schedule.next_delay();
        debug!(?delay, "sleeping before next poll");
        pause(delay, deadline, cancel, &tracker).await?;
    }
}

/// Sleeps for `delay`, never past `deadline`, unless cancelled first.
async fn pause(
    delay: Duration,
    deadline: Instant,
    cancel: &CancellationToken,
    tracker: &Tracker,
) -> Result<(), WaitError> {
    let bounded = delay.min(deadline.saturating_duration_since(Instant::now()));
    if bounded.is_zero() {
        return if cancel.is_cancelled() {
            Err(tracker.cancelled())
        } else {
            Ok(())
        };
    }
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(tracker.cancelled()),
        () = sleep(bounded) => Ok(()),
    }
}

enum Step<S> {
    Continue,
    Settled(WaitOutcome<S>),
}

/// Counters carried across polls of one wait.
#[derive(Debug, Default)]
struct Tracker {
    polls: u32,
    absences: u32,
    target_hits: u32,
    last_status: Option<String>,
}

impl Tracker {
    fn record<S>(
        &mut self,
        spec: &WaiterSpec,
        observed: Result<Option<Observation<S>>, ProbeError>,
    ) -> Result<Step<S>, WaitError> {
        self.polls += 1;
        match observed {
            Ok(Some(obs)) => Ok(self.present(spec, obs)),
            Ok(None) => self.absent(spec, None),
            Err(err) if err.is_not_found() => self.absent(spec, Some(err.to_string())),
            Err(err) => Err(WaitError::Probe(err)),
        }
    }

    fn present<S>(&mut self, spec: &WaiterSpec, obs: Observation<S>) -> Step<S> {
        debug!(status = %obs.status, poll = self.polls, "observed status");
        self.absences = 0;
        self.last_status = Some(obs.status.clone());

        if spec.is_target(&obs.status) {
            self.target_hits += 1;
            if self.target_hits >= spec.continuous_target_occurrences() {
                return Step::Settled(WaitOutcome::Reached(obs));
            }
            return Step::Continue;
        }
        if spec.is_pending(&obs.status) {
            self.target_hits = 0;
            return Step::Continue;
        }
        Step::Settled(WaitOutcome::Unexpected(obs))
    }

    // Absence never resets `target_hits`; one flaky poll between two target
    // observations must not restart the debounce.
    fn absent<S>(&mut self, spec: &WaiterSpec, message: Option<String>) -> Result<Step<S>, WaitError> {
        debug!(poll = self.polls, "resource not observable");
        if spec.waits_for_absence() {
            self.target_hits += 1;
            self.last_status = None;
            if self.target_hits >= spec.continuous_target_occurrences() {
                return Ok(Step::Settled(WaitOutcome::Gone));
            }
            return Ok(Step::Continue);
        }

        self.absences += 1;
        if self.absences > spec.not_found_tolerance() {
            return Err(WaitError::NotFound {
                checks: self.absences,
                message,
            });
        }
        Ok(Step::Continue)
    }

    fn timed_out(&self, spec: &WaiterSpec) -> WaitError {
        WaitError::TimedOut {
            timeout: spec.timeout(),
            last_status: self.last_status.clone(),
            expected: spec.target().iter().cloned().collect(),
        }
    }

    fn cancelled(&self) -> WaitError {
        WaitError::Cancelled {
            last_status: self.last_status.clone(),
        }
    }
}

/// Sleep schedule between polls: exponential backoff or a fixed interval,
/// floored at `min_poll_interval`.
struct PollSchedule {
    fixed: Option<Duration>,
    floor: Duration,
    backoff: ExponentialBackoff,
}

impl PollSchedule {
    fn new(spec: &WaiterSpec) -> Self {
        Self {
            fixed: spec.poll_interval(),
            floor: spec.min_poll_interval(),
            backoff: ExponentialBuilder::default()
                .with_min_delay(INITIAL_BACKOFF)
                .with_max_delay(MAX_BACKOFF)
                .with_factor(2.0)
                .with_max_times(usize::MAX)
                .build(),
        }
    }

    fn next_delay(&mut self) -> Duration {
        let base = match self.fixed {
            Some(interval) => interval,
            None => self.backoff.next().unwrap_or(MAX_BACKOFF),
        };
        whole_millis(base).max(self.floor)
    }
}

/// Rounds to the nearest millisecond; the backoff scales by an `f32` factor
/// and drifts by a few nanoseconds per step.
fn whole_millis(delay: Duration) -> Duration {
    let millis = delay
        .as_micros()
        .saturating_add(500)
        .checked_div(1000)
        .unwrap_or_default();
    Duration::from_millis(u64::try_from(millis).unwrap_or(u64::MAX))
}
