//! World and fixtures for diagnosis behaviour tests.

use std::cell::RefCell;

use rstest::fixture;
use stackwatch::events::{self, Category, DiagnoseError, EventRecord, ROOT_RESOURCE_TYPE};
use stackwatch::failure::FailureReason;
use stackwatch::test_support::ScriptedEvents;
use thiserror::Error;
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

const BUCKET: &str = "AWS::S3::Bucket";
const QUEUE: &str = "AWS::SQS::Queue";

#[derive(Debug, Error)]
pub enum StepError {
    #[error("failed to start runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("diagnosis has not run yet")]
    NotRun,
    #[error("diagnosis failed: {0}")]
    Diagnose(#[from] DiagnoseError),
    #[error("assertion failed: {0}")]
    Assertion(String),
}

pub struct DiagnosisWorld {
    pub events: RefCell<Vec<EventRecord>>,
    pub categories: RefCell<Vec<Category>>,
    pub reasons: RefCell<Option<Vec<FailureReason>>>,
}

impl DiagnosisWorld {
    pub fn new() -> Self {
        Self {
            events: RefCell::new(Vec::new()),
            categories: RefCell::new(vec![Category::Failed]),
            reasons: RefCell::new(None),
        }
    }

    pub fn diagnose(&self, token: &str) -> Result<(), StepError> {
        let source = ScriptedEvents::new(self.events.borrow().clone());
        let categories = self.categories.borrow().clone();
        let runtime = Runtime::new()?;
        let reasons = runtime.block_on(events::diagnose(
            &source,
            token,
            &categories,
            &CancellationToken::new(),
        ))?;
        self.reasons.replace(Some(reasons));
        Ok(())
    }

    pub fn reason_texts(&self) -> Result<Vec<String>, StepError> {
        self.reasons
            .borrow()
            .as_ref()
            .map(|reasons| reasons.iter().map(ToString::to_string).collect())
            .ok_or(StepError::NotRun)
    }
}

/// Builds a log where `older` failed an update before `newer` failed a
/// create and rolled back.
pub fn interleaved_log(older: &str, newer: &str) -> Vec<EventRecord> {
    vec![
        EventRecord::new(older, ROOT_RESOURCE_TYPE, "UPDATE_IN_PROGRESS", 1),
        EventRecord::new(older, BUCKET, "UPDATE_FAILED", 2).with_reason("bucket policy rejected"),
        EventRecord::new(older, ROOT_RESOURCE_TYPE, "UPDATE_ROLLBACK_COMPLETE", 3),
        EventRecord::new(newer, ROOT_RESOURCE_TYPE, "CREATE_IN_PROGRESS", 4),
        EventRecord::new(newer, BUCKET, "CREATE_FAILED", 5).with_reason("X invalid"),
        EventRecord::new(newer, QUEUE, "CREATE_FAILED", 6).with_reason("Y invalid"),
        EventRecord::new(newer, ROOT_RESOURCE_TYPE, "ROLLBACK_IN_PROGRESS", 7)
            .with_reason("rolling back"),
        EventRecord::new(newer, ROOT_RESOURCE_TYPE, "ROLLBACK_COMPLETE", 8),
    ]
}

#[fixture]
pub fn diagnosis_world() -> DiagnosisWorld {
    DiagnosisWorld::new()
}
