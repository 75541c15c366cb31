//! World and fixtures for retry behaviour tests.

use std::cell::RefCell;
use std::time::Duration;

use rstest::fixture;
use stackwatch::operations::{self, Submitted};
use stackwatch::retry::{RetryError, RetryPolicy};
use stackwatch::types::OperationToken;
use thiserror::Error;
use tokio::runtime::{Builder, Runtime};
use tokio_util::sync::CancellationToken;

/// Error returned by the scripted mutating call.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("{0}")]
pub struct ApiError(pub String);

#[derive(Debug, Error)]
pub enum StepError {
    #[error("failed to start runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("the call has not been submitted yet")]
    NotRun,
    #[error("assertion failed: {0}")]
    Assertion(String),
}

pub type SubmitResult = Result<Submitted<u32>, RetryError<ApiError>>;

/// Scripted mutating call: fails `failures` times with `message`, then
/// succeeds.
pub struct RetryWorld {
    pub failures: RefCell<u32>,
    pub message: RefCell<String>,
    pub policy: RefCell<RetryPolicy>,
    pub tokens: RefCell<Vec<OperationToken>>,
    pub result: RefCell<Option<SubmitResult>>,
}

impl RetryWorld {
    pub fn new() -> Self {
        Self {
            failures: RefCell::new(0),
            message: RefCell::new(String::new()),
            policy: RefCell::new(RetryPolicy::default()),
            tokens: RefCell::new(Vec::new()),
            result: RefCell::new(None),
        }
    }

    pub fn submit(&self) -> Result<(), StepError> {
        let policy = *self.policy.borrow();
        let failures = *self.failures.borrow();
        let message = self.message.borrow().clone();

        let runtime = paused_runtime()?;
        let result = runtime.block_on(operations::submit(
            &policy,
            &CancellationToken::new(),
            |token| {
                self.tokens.borrow_mut().push(token);
                let attempt = u32::try_from(self.tokens.borrow().len()).unwrap_or(u32::MAX);
                let message = message.clone();
                async move {
                    if attempt <= failures {
                        Err(ApiError(message))
                    } else {
                        Ok(attempt)
                    }
                }
            },
        ));
        self.result.replace(Some(result));
        Ok(())
    }

    pub fn attempts(&self) -> usize {
        self.tokens.borrow().len()
    }
}

pub fn paused_runtime() -> Result<Runtime, std::io::Error> {
    Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
}

pub const fn budget(seconds: u64) -> RetryPolicy {
    RetryPolicy::new(Duration::from_secs(seconds))
}

#[fixture]
pub fn retry_world() -> RetryWorld {
    RetryWorld::new()
}
