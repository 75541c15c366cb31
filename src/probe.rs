//! Collaborator interfaces consumed by the waiter and the diagnosis pass.
//!
//! Resource-specific adapters implement [`StatusProbe`] (one describe call
//! by identifier) and [`EventSource`] (the operation event log). Both return
//! boxed futures so they stay object-safe without an async-trait shim.

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::events::EventRecord;

/// Future returned by collaborator calls.
pub type ProbeFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ProbeError>> + Send + 'a>>;

/// One describe result: the reported status plus the provider's state object.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Observation<S> {
    /// Status code reported by the provider (for example `CREATE_COMPLETE`).
    pub status: String,
    /// Free-text explanation attached to the status, when the API has one.
    pub status_reason: Option<String>,
    /// Opaque state object returned by the describe call.
    pub state: S,
}

impl<S> Observation<S> {
    /// Builds an observation without a status reason.
    #[must_use]
    pub fn new(status: impl Into<String>, state: S) -> Self {
        Self {
            status: status.into(),
            status_reason: None,
            state,
        }
    }

    /// Attaches a status reason.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.status_reason = Some(reason.into());
        self
    }
}

/// Errors raised by describe and listing calls.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ProbeError {
    /// The resource does not exist (yet, or any more).
    #[error("resource not found: {message}")]
    NotFound {
        /// Message returned by the provider.
        message: String,
    },
    /// Any other failure of the underlying request.
    #[error("request failed: {message}")]
    Request {
        /// Message returned by the provider.
        message: String,
    },
}

impl ProbeError {
    /// Returns `true` when the error signals absence.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Describe-by-identifier capability bound to one resource.
pub trait StatusProbe {
    /// State object returned alongside the status.
    type State: Send;

    /// Issues one describe call.
    ///
    /// `Ok(None)` means nothing is observable yet without an error, which the
    /// waiter counts the same way as [`ProbeError::NotFound`].
    fn describe(&self) -> ProbeFuture<'_, Option<Observation<Self::State>>>;
}

/// Operation event log for one resource.
pub trait EventSource {
    /// Lists every event currently recorded, in any consistent order.
    fn list_events(&self) -> ProbeFuture<'_, Vec<EventRecord>>;
}

/// Per-target outcome of a fan-out operation (for example one stack
/// instance of a stack-set operation).
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize)]
pub struct OperationResult {
    /// Account the target lives in.
    pub account: String,
    /// Region the target lives in.
    pub region: String,
    /// Result status for the target.
    pub status: String,
    /// Explanation attached to the status.
    #[serde(default)]
    pub status_reason: Option<String>,
}

/// Listing of per-target results for one fan-out operation.
pub trait OperationResultSource {
    /// Lists every result recorded for the operation.
    fn list_results(&self) -> ProbeFuture<'_, Vec<OperationResult>>;
}

/// Probe adapter that reports selected statuses as absence.
///
/// Deletion waits use this to fold an explicit `DELETE_COMPLETE` into the
/// same "gone" path as a not-found describe.
#[derive(Clone, Debug)]
pub struct AbsentOn<P> {
    inner: P,
    statuses: Vec<String>,
}

impl<P> AbsentOn<P> {
    /// Wraps `inner`, treating any of `statuses` as absence.
    #[must_use]
    pub fn new<I, T>(inner: P, statuses: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            inner,
            statuses: statuses.into_iter().map(Into::into).collect(),
        }
    }
}

impl<P> StatusProbe for AbsentOn<P>
where
    P: StatusProbe + Sync,
{
    type State = P::State;

    fn describe(&self) -> ProbeFuture<'_, Option<Observation<Self::State>>> {
        Box::pin(async move {
            let observed = self.inner.describe().await?;
            Ok(observed.filter(|obs| !self.statuses.iter().any(|status| *status == obs.status)))
        })
    }
}

impl<P> StatusProbe for &P
where
    P: StatusProbe + Sync + ?Sized,
{
    type State = P::State;

    fn describe(&self) -> ProbeFuture<'_, Option<Observation<Self::State>>> {
        (**self).describe()
    }
}

impl<E> EventSource for &E
where
    E: EventSource + Sync + ?Sized,
{
    fn list_events(&self) -> ProbeFuture<'_, Vec<EventRecord>> {
        (**self).list_events()
    }
}
