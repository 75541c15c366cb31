//! Strategies for explaining why an operation settled in a failure status.

use std::future::{self, Future};
use std::pin::Pin;

use tokio_util::sync::CancellationToken;

use super::status::{RESULT_FAILED, stack};
use crate::events::{self, Category, DiagnoseError};
use crate::failure::FailureReason;
use crate::probe::{EventSource, Observation, OperationResult, OperationResultSource};
use crate::types::OperationToken;

/// Future returned by [`FailureDiagnostics::reasons`].
pub type DiagnosisFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<FailureReason>, DiagnoseError>> + Send + 'a>>;

/// Produces the reasons behind an unexpected terminal status.
pub trait FailureDiagnostics<S> {
    /// Collects reasons for `observation`, which settled outside the
    /// pending and target sets.
    fn reasons<'a>(
        &'a self,
        observation: &'a Observation<S>,
        cancel: &'a CancellationToken,
    ) -> DiagnosisFuture<'a>;
}

/// Picks which event categories explain a given terminal status.
pub type CategoryRule = fn(&str) -> &'static [Category];

/// Diagnosis from the resource's event log, correlated by operation token.
#[derive(Clone, Debug)]
pub struct EventDiagnostics<E> {
    source: E,
    token: OperationToken,
    rule: CategoryRule,
}

impl<E> EventDiagnostics<E> {
    /// Builds diagnostics that select categories with `rule`.
    #[must_use]
    pub const fn new(source: E, token: OperationToken, rule: CategoryRule) -> Self {
        Self {
            source,
            token,
            rule,
        }
    }

    /// Diagnostics for a stack create.
    #[must_use]
    pub const fn for_stack_create(source: E, token: OperationToken) -> Self {
        Self::new(source, token, stack_create_categories)
    }

    /// Diagnostics for a stack update or delete.
    #[must_use]
    pub const fn failed_only(source: E, token: OperationToken) -> Self {
        Self::new(source, token, failed_categories)
    }

    /// Token the diagnosis correlates on.
    #[must_use]
    pub const fn token(&self) -> &OperationToken {
        &self.token
    }
}

/// Selects only `*_FAILED` records, whatever the terminal status.
#[must_use]
pub fn failed_categories(_status: &str) -> &'static [Category] {
    &[Category::Failed]
}

/// A failed create either rolled back or was deleted on failure; each case
/// records its explanation under a different category.
#[must_use]
pub fn stack_create_categories(status: &str) -> &'static [Category] {
    match status {
        stack::CREATE_FAILED | stack::ROLLBACK_COMPLETE | stack::ROLLBACK_FAILED => {
            &[Category::Failed, Category::Rollback]
        }
        stack::DELETE_COMPLETE | stack::DELETE_FAILED => &[Category::Failed, Category::Deletion],
        _ => &[Category::Failed],
    }
}

impl<E, S> FailureDiagnostics<S> for EventDiagnostics<E>
where
    E: EventSource + Sync,
    S: Sync,
{
    fn reasons<'a>(
        &'a self,
        observation: &'a Observation<S>,
        cancel: &'a CancellationToken,
    ) -> DiagnosisFuture<'a> {
        let categories = (self.rule)(&observation.status);
        Box::pin(events::diagnose(
            &self.source,
            self.token.as_str(),
            categories,
            cancel,
        ))
    }
}

/// Diagnosis from the status reason carried on the observation itself.
#[derive(Clone, Copy, Debug, Default)]
pub struct StatusReasonDiagnostics;

impl<S> FailureDiagnostics<S> for StatusReasonDiagnostics
where
    S: Sync,
{
    fn reasons<'a>(
        &'a self,
        observation: &'a Observation<S>,
        _cancel: &'a CancellationToken,
    ) -> DiagnosisFuture<'a> {
        let reasons: Vec<FailureReason> = observation
            .status_reason
            .as_deref()
            .filter(|text| !text.is_empty())
            .map(FailureReason::from)
            .into_iter()
            .collect();
        Box::pin(future::ready(Ok::<_, DiagnoseError>(reasons)))
    }
}

/// Diagnosis from the per-target results of a fan-out operation.
#[derive(Clone, Debug)]
pub struct OperationResultDiagnostics<R> {
    source: R,
}

impl<R> OperationResultDiagnostics<R> {
    /// Wraps a result listing.
    #[must_use]
    pub const fn new(source: R) -> Self {
        Self { source }
    }
}

impl<R, S> FailureDiagnostics<S> for OperationResultDiagnostics<R>
where
    R: OperationResultSource + Sync,
    S: Sync,
{
    fn reasons<'a>(
        &'a self,
        _observation: &'a Observation<S>,
        cancel: &'a CancellationToken,
    ) -> DiagnosisFuture<'a> {
        Box::pin(failed_results(&self.source, cancel))
    }
}

async fn failed_results<R>(
    source: &R,
    cancel: &CancellationToken,
) -> Result<Vec<FailureReason>, DiagnoseError>
where
    R: OperationResultSource + ?Sized,
{
    let results = tokio::select! {
        biased;
        () = cancel.cancelled() => return Err(DiagnoseError::Cancelled),
        listed = source.list_results() => listed?,
    };
    Ok(results
        .iter()
        .filter(|result| result.status == RESULT_FAILED)
        .map(result_reason)
        .collect())
}

/// Formats one failed target as a reason line.
#[must_use]
pub fn result_reason(result: &OperationResult) -> FailureReason {
    FailureReason::new(format!(
        "Account ({}), Region ({}), Status ({}), Status Reason: {}",
        result.account,
        result.region,
        result.status,
        result.status_reason.as_deref().unwrap_or_default()
    ))
}
