//! Ready-made wait profiles for provider operations, plus the glue that
//! turns an unexpected terminal status into a diagnosed error.
//!
//! A caller submits the mutating call through [`submit`], waits with
//! [`await_operation`] using one of the [`OperationProfile`] constants, and
//! receives either the settled observation or an [`OperationFailed`] naming
//! the status and its reasons.

mod diagnostics;
pub mod status;

use std::error::Error;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::events::DiagnoseError;
use crate::failure::{self, OperationFailed};
use crate::probe::{AbsentOn, Observation, StatusProbe};
use crate::retry::{RetryError, RetryPolicy, is_propagation_error, retry_until};
use crate::types::OperationToken;
use crate::waiter::{self, SpecError, WaitError, WaitOutcome, WaiterSpec, WaiterSpecBuilder};

pub use diagnostics::{
    CategoryRule, DiagnosisFuture, EventDiagnostics, FailureDiagnostics,
    OperationResultDiagnostics, StatusReasonDiagnostics, failed_categories, result_reason,
    stack_create_categories,
};

/// Delay before polling a freshly submitted stack-set operation.
pub const STACK_SET_OPERATION_DELAY: Duration = Duration::from_secs(5);

/// Which configured deadline a profile waits with.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TimeoutKind {
    /// `create_timeout_secs`.
    Create,
    /// `update_timeout_secs`.
    Update,
    /// `delete_timeout_secs`.
    Delete,
}

/// Status sets and timing for one kind of long-running operation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct OperationProfile {
    /// Short name used in logs.
    pub name: &'static str,
    /// Statuses meaning the operation is still running.
    pub pending: &'static [&'static str],
    /// Statuses meaning success; empty when success is disappearance.
    pub target: &'static [&'static str],
    /// Statuses folded into absence before the waiter sees them.
    pub absent_on: &'static [&'static str],
    /// Sleep before the first poll.
    pub initial_delay: Duration,
    /// Floor for the sleep between polls.
    pub min_poll_interval: Duration,
    /// Configured deadline the profile waits with.
    pub timeout: TimeoutKind,
}

impl OperationProfile {
    /// Returns a spec builder preloaded with this profile.
    #[must_use]
    pub fn spec_builder(&self, timeout: Duration) -> WaiterSpecBuilder {
        WaiterSpec::builder(timeout)
            .pending(self.pending.iter().copied())
            .target(self.target.iter().copied())
            .initial_delay(self.initial_delay)
            .min_poll_interval(self.min_poll_interval)
    }

    /// Builds the [`WaiterSpec`] for this profile.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::ZeroTimeout`] when `timeout` is zero.
    pub fn spec(&self, timeout: Duration) -> Result<WaiterSpec, SpecError> {
        self.spec_builder(timeout).build()
    }

    /// Wraps `probe` so this profile's [`OperationProfile::absent_on`]
    /// statuses read as absence.
    #[must_use]
    pub fn adapt<P>(&self, probe: P) -> AbsentOn<P> {
        AbsentOn::new(probe, self.absent_on.iter().copied())
    }
}

/// Stack creation.
pub const STACK_CREATE: OperationProfile = OperationProfile {
    name: "stack-create",
    pending: &[
        status::stack::CREATE_IN_PROGRESS,
        status::stack::ROLLBACK_IN_PROGRESS,
        status::stack::DELETE_IN_PROGRESS,
    ],
    target: &[status::stack::CREATE_COMPLETE],
    absent_on: &[],
    initial_delay: Duration::ZERO,
    min_poll_interval: Duration::from_secs(1),
    timeout: TimeoutKind::Create,
};

/// Stack update.
pub const STACK_UPDATE: OperationProfile = OperationProfile {
    name: "stack-update",
    pending: &[
        status::stack::UPDATE_IN_PROGRESS,
        status::stack::UPDATE_COMPLETE_CLEANUP_IN_PROGRESS,
        status::stack::UPDATE_ROLLBACK_IN_PROGRESS,
        status::stack::UPDATE_ROLLBACK_COMPLETE_CLEANUP_IN_PROGRESS,
    ],
    target: &[status::stack::UPDATE_COMPLETE],
    absent_on: &[],
    initial_delay: Duration::ZERO,
    min_poll_interval: Duration::from_secs(1),
    timeout: TimeoutKind::Update,
};

/// Stack deletion; a `DELETE_COMPLETE` stack counts as gone.
pub const STACK_DELETE: OperationProfile = OperationProfile {
    name: "stack-delete",
    pending: &[
        status::stack::DELETE_IN_PROGRESS,
        status::stack::ROLLBACK_IN_PROGRESS,
    ],
    target: &[],
    absent_on: &[status::stack::DELETE_COMPLETE],
    initial_delay: Duration::ZERO,
    min_poll_interval: Duration::from_secs(1),
    timeout: TimeoutKind::Delete,
};

/// Stack-set operation (create, update, or delete of instances).
pub const STACK_SET_OPERATION: OperationProfile = OperationProfile {
    name: "stack-set-operation",
    pending: &[
        status::stack_set_operation::QUEUED,
        status::stack_set_operation::RUNNING,
        status::stack_set_operation::STOPPING,
    ],
    target: &[status::stack_set_operation::SUCCEEDED],
    absent_on: &[],
    initial_delay: STACK_SET_OPERATION_DELAY,
    min_poll_interval: Duration::ZERO,
    timeout: TimeoutKind::Update,
};

/// Change-set creation.
pub const CHANGE_SET_CREATE: OperationProfile = OperationProfile {
    name: "change-set-create",
    pending: &[
        status::change_set::CREATE_PENDING,
        status::change_set::CREATE_IN_PROGRESS,
    ],
    target: &[status::change_set::CREATE_COMPLETE],
    absent_on: &[],
    initial_delay: Duration::ZERO,
    min_poll_interval: Duration::ZERO,
    timeout: TimeoutKind::Create,
};

/// Extension type registration.
pub const TYPE_REGISTRATION: OperationProfile = OperationProfile {
    name: "type-registration",
    pending: &[status::type_registration::IN_PROGRESS],
    target: &[status::type_registration::COMPLETE],
    absent_on: &[],
    initial_delay: Duration::ZERO,
    min_poll_interval: Duration::ZERO,
    timeout: TimeoutKind::Create,
};

/// Resource rule becoming active.
pub const RESOURCE_RULE_ACTIVE: OperationProfile = OperationProfile {
    name: "resource-rule-active",
    pending: &[status::resource_rule::EVALUATING],
    target: &[status::resource_rule::ACTIVE],
    absent_on: &[],
    initial_delay: Duration::ZERO,
    min_poll_interval: Duration::ZERO,
    timeout: TimeoutKind::Create,
};

/// Resource rule deletion.
pub const RESOURCE_RULE_DELETED: OperationProfile = OperationProfile {
    name: "resource-rule-deleted",
    pending: &[
        status::resource_rule::ACTIVE,
        status::resource_rule::DELETING,
        status::resource_rule::DELETING_RESULTS,
        status::resource_rule::EVALUATING,
    ],
    target: &[],
    absent_on: &[],
    initial_delay: Duration::ZERO,
    min_poll_interval: Duration::ZERO,
    timeout: TimeoutKind::Delete,
};

/// Every built-in profile.
pub const PROFILES: [OperationProfile; 8] = [
    STACK_CREATE,
    STACK_UPDATE,
    STACK_DELETE,
    STACK_SET_OPERATION,
    CHANGE_SET_CREATE,
    TYPE_REGISTRATION,
    RESOURCE_RULE_ACTIVE,
    RESOURCE_RULE_DELETED,
];

/// Looks up a built-in profile by [`OperationProfile::name`].
#[must_use]
pub fn profile(name: &str) -> Option<OperationProfile> {
    PROFILES.into_iter().find(|profile| profile.name == name)
}

/// Errors returned by [`await_operation`].
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum OperationError {
    /// The wait itself failed (timeout, absence, probe error, cancel).
    #[error(transparent)]
    Wait(#[from] WaitError),
    /// The operation settled in a failure status.
    #[error(transparent)]
    Failed(#[from] OperationFailed),
    /// The operation settled in a failure status and the diagnosis pass
    /// could not run to completion.
    #[error("operation failed with status {status}; diagnosis unavailable: {source}")]
    Diagnosis {
        /// Terminal status reported by the provider.
        status: String,
        /// Why diagnosis failed.
        #[source]
        source: DiagnoseError,
    },
}

/// Waits for an operation described by `spec` and diagnoses any failure.
///
/// Returns the target observation, or `None` when the resource is gone and
/// absence was the goal.
///
/// # Errors
///
/// Returns [`OperationError::Wait`] when the wait does not settle,
/// [`OperationError::Failed`] when it settles outside the target set, and
/// [`OperationError::Diagnosis`] when that failure cannot be explained.
pub async fn await_operation<P, D>(
    spec: &WaiterSpec,
    probe: &P,
    diagnostics: &D,
    cancel: &CancellationToken,
) -> Result<Option<Observation<P::State>>, OperationError>
where
    P: StatusProbe + ?Sized,
    D: FailureDiagnostics<P::State> + ?Sized,
{
    match waiter::wait(probe, spec, cancel).await? {
        WaitOutcome::Reached(observation) => Ok(Some(observation)),
        WaitOutcome::Gone => Ok(None),
        WaitOutcome::Unexpected(observation) => {
            let reasons = diagnostics
                .reasons(&observation, cancel)
                .await
                .map_err(|source| OperationError::Diagnosis {
                    status: observation.status.clone(),
                    source,
                })?;
            warn!(
                status = %observation.status,
                reasons = reasons.len(),
                "operation settled in a failure status"
            );
            Err(failure::build(observation.status, reasons).into())
        }
    }
}

/// Value returned by a successful [`submit`] with the token it was sent
/// under.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Submitted<T> {
    /// Response of the mutating call.
    pub value: T,
    /// Token of the attempt that succeeded; diagnosis correlates on it.
    pub token: OperationToken,
}

/// Issues a mutating call, retrying propagation errors with a fresh
/// [`OperationToken`] per attempt.
///
/// # Errors
///
/// Returns the [`RetryError`] from [`retry_until`].
pub async fn submit<T, E, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut call: F,
) -> Result<Submitted<T>, RetryError<E>>
where
    E: Error + 'static,
    F: FnMut(OperationToken) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    retry_until(
        policy,
        cancel,
        |err: &E| is_propagation_error(Some(err)),
        |attempt| {
            let token = OperationToken::generate();
            debug!(attempt, %token, "submitting mutating call");
            let pending = call(token.clone());
            async move { pending.await.map(|value| Submitted { value, token }) }
        },
    )
    .await
}
