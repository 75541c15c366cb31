//! Core library for stackwatch, a waiter and failure explainer for
//! long-running cloud provisioning operations.
//!
//! A provider-side adapter exposes a [`StatusProbe`] (describe by
//! identifier) and an [`EventSource`] (the operation event log). The crate
//! then polls until the operation settles ([`waiter::wait`]), correlates
//! the event log by the operation's [`OperationToken`]
//! ([`events::correlate`]), and turns failure records into one readable
//! error ([`failure::build`]). Mutating calls that race credential
//! propagation are retried with [`retry::retry_until`].

pub mod config;
pub mod events;
pub mod failure;
pub mod operations;
pub mod probe;
pub mod replay;
pub mod retry;
pub mod test_support;
pub mod types;
pub mod waiter;

pub use config::{ConfigError, WaitConfig};
pub use events::{Category, CorrelationError, CorrelationWindow, DiagnoseError, EventRecord};
pub use failure::{FailureReason, OperationFailed};
pub use operations::{
    OperationError, OperationProfile, Submitted, TimeoutKind, await_operation, submit,
};
pub use probe::{
    AbsentOn, EventSource, Observation, OperationResult, OperationResultSource, ProbeError,
    ProbeFuture, StatusProbe,
};
pub use replay::{RecordedEvents, RecordedObservation, RecordedProbe, ReplayError};
pub use retry::{RetryError, RetryPolicy, is_propagation_error, retry_until};
pub use types::OperationToken;
pub use waiter::{SpecError, WaitError, WaitOutcome, WaiterSpec, WaiterSpecBuilder};
