//! Shared world and runtime helpers for waiter behaviour tests.
//!
//! Steps borrow a single [`WaiterWorld`]; the scripted probe shares its
//! queue across clones, and the builder and outcome sit behind `RefCell`s so
//! `Given` steps can adjust them in place.

use std::cell::RefCell;
use std::time::Duration;

use rstest::fixture;
use stackwatch::operations::{self, OperationProfile};
use stackwatch::probe::AbsentOn;
use stackwatch::test_support::ScriptedProbe;
use stackwatch::waiter::{self, WaitError, WaitOutcome};
use thiserror::Error;
use tokio::runtime::{Builder, Runtime};
use tokio_util::sync::CancellationToken;

/// Deadline used unless a scenario overrides it.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Debug, Error)]
pub enum StepError {
    #[error("unknown operation profile: {0}")]
    UnknownProfile(String),
    #[error("no profile selected; start the scenario with a waiter step")]
    NoProfile,
    #[error("waiter settings rejected: {0}")]
    Spec(#[from] stackwatch::waiter::SpecError),
    #[error("failed to start runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("the waiter has not run yet")]
    NotRun,
    #[error("assertion failed: {0}")]
    Assertion(String),
}

pub type WaitResult = Result<WaitOutcome<()>, WaitError>;

pub struct WaiterWorld {
    pub probe: ScriptedProbe,
    pub profile: RefCell<Option<OperationProfile>>,
    pub timeout: RefCell<Duration>,
    pub tolerance: RefCell<Option<u32>>,
    pub result: RefCell<Option<WaitResult>>,
}

impl WaiterWorld {
    pub fn new() -> Self {
        Self {
            probe: ScriptedProbe::new(),
            profile: RefCell::new(None),
            timeout: RefCell::new(DEFAULT_TIMEOUT),
            tolerance: RefCell::new(None),
            result: RefCell::new(None),
        }
    }

    /// Builds the waiter settings from the selected profile and runs the waiter on a
    /// paused clock so deadlines elapse instantly.
    pub fn run(&self) -> Result<(), StepError> {
        let profile = (*self.profile.borrow()).ok_or(StepError::NoProfile)?;
        let mut builder = profile.spec_builder(*self.timeout.borrow());
        if let Some(count) = *self.tolerance.borrow() {
            builder = builder.not_found_tolerance(count);
        }
        let spec = builder.build()?;
        let probe = profile.adapt(self.probe.clone());

        let runtime = paused_runtime()?;
        let result = runtime.block_on(wait_with(&probe, &spec));
        self.result.replace(Some(result));
        Ok(())
    }

    pub fn select(&self, name: &str) -> Result<(), StepError> {
        let profile =
            operations::profile(name).ok_or_else(|| StepError::UnknownProfile(name.to_owned()))?;
        self.profile.replace(Some(profile));
        Ok(())
    }
}

async fn wait_with(probe: &AbsentOn<ScriptedProbe>, spec: &waiter::WaiterSpec) -> WaitResult {
    waiter::wait(probe, spec, &CancellationToken::new()).await
}

pub fn paused_runtime() -> Result<Runtime, std::io::Error> {
    Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
}

#[fixture]
pub fn waiter_world() -> WaiterWorld {
    WaiterWorld::new()
}
