//! Operation event correlation and failure classification.
//!
//! A provider's event log interleaves records from every operation ever run
//! against a resource. [`correlate`] isolates the contiguous run belonging
//! to one operation token, and [`select_reasons`] keeps the records whose
//! status marks them as a failure, rollback, or root deletion signal.
//! Everything here is a pure function over an already-fetched listing;
//! only [`diagnose`] performs I/O.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::failure::FailureReason;
use crate::probe::{EventSource, ProbeError};

/// Status suffix marking a failed resource step.
pub const FAILED_SUFFIX: &str = "_FAILED";
/// Status prefix marking a rollback step.
pub const ROLLBACK_PREFIX: &str = "ROLLBACK_";
/// Status recorded when a deletion starts.
pub const DELETE_IN_PROGRESS: &str = "DELETE_IN_PROGRESS";
/// Resource type of the root container (as opposed to its children).
pub const ROOT_RESOURCE_TYPE: &str = "AWS::CloudFormation::Stack";

/// One record from the operation event log.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventRecord {
    /// Operation token the backend echoed into this record.
    #[serde(default)]
    pub token: String,
    /// Type of the resource the record describes.
    pub resource_type: String,
    /// Status code recorded for the resource.
    pub status: String,
    /// Reason text attached to the status, if any.
    #[serde(default)]
    pub reason: Option<String>,
    /// Position in the log; larger is newer.
    pub sequence: u64,
}

impl EventRecord {
    /// Builds a record without reason text.
    #[must_use]
    pub fn new(
        token: impl Into<String>,
        resource_type: impl Into<String>,
        status: impl Into<String>,
        sequence: u64,
    ) -> Self {
        Self {
            token: token.into(),
            resource_type: resource_type.into(),
            status: status.into(),
            reason: None,
            sequence,
        }
    }

    /// Attaches reason text.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    fn reason_text(&self) -> Option<&str> {
        self.reason.as_deref().filter(|text| !text.is_empty())
    }
}

/// Kinds of diagnostic signal a record can carry.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Category {
    /// A resource step ended in a `*_FAILED` status.
    Failed,
    /// A `ROLLBACK_*` step on any resource.
    Rollback,
    /// The root container started deleting (for example on-failure delete).
    Deletion,
}

impl Category {
    /// Every category, in classification priority order.
    pub const ALL: [Self; 3] = [Self::Failed, Self::Rollback, Self::Deletion];

    /// Returns `true` when `record` carries this category's signal. Records
    /// without reason text never match.
    #[must_use]
    pub fn matches(self, record: &EventRecord) -> bool {
        if record.reason_text().is_none() {
            return false;
        }
        match self {
            Self::Failed => record.status.ends_with(FAILED_SUFFIX),
            Self::Rollback => record.status.starts_with(ROLLBACK_PREFIX),
            Self::Deletion => {
                record.status == DELETE_IN_PROGRESS && record.resource_type == ROOT_RESOURCE_TYPE
            }
        }
    }

    /// Returns the highest-priority category `record` belongs to.
    #[must_use]
    pub fn classify(record: &EventRecord) -> Option<Self> {
        Self::ALL.into_iter().find(|category| category.matches(record))
    }
}

/// Contiguous run of records sharing one operation token, oldest first.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CorrelationWindow {
    records: Vec<EventRecord>,
}

impl CorrelationWindow {
    /// Records inside the window, oldest first.
    #[must_use]
    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Returns `true` when no record carried the token.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Errors raised while correlating an event log.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum CorrelationError {
    /// The token reappeared after its window had closed, so the log does
    /// not group the operation's records contiguously.
    #[error("events for token {token} are not contiguous: token reappears at sequence {sequence}")]
    NonContiguous {
        /// Token being correlated.
        token: String,
        /// Sequence of the first record found after the gap.
        sequence: u64,
    },
}

/// Isolates the records belonging to `token`.
///
/// Records are first ordered by `sequence`, so newest-first listings are
/// accepted. An empty token, or one no record carries, yields an empty
/// window.
///
/// # Errors
///
/// Returns [`CorrelationError::NonContiguous`] when the token shows up
/// again after another operation's records.
pub fn correlate(events: &[EventRecord], token: &str) -> Result<CorrelationWindow, CorrelationError> {
    if token.is_empty() {
        return Ok(CorrelationWindow::default());
    }

    let mut ordered: Vec<&EventRecord> = events.iter().collect();
    ordered.sort_by_key(|record| record.sequence);

    let mut remaining = ordered
        .into_iter()
        .skip_while(|record| record.token != token);
    let records: Vec<EventRecord> = remaining
        .by_ref()
        .take_while(|record| record.token == token)
        .cloned()
        .collect();

    if let Some(stray) = remaining.find(|record| record.token == token) {
        return Err(CorrelationError::NonContiguous {
            token: token.to_owned(),
            sequence: stray.sequence,
        });
    }

    Ok(CorrelationWindow { records })
}

/// Returns the reasons of every window record matching any of
/// `categories`, in chronological order and without de-duplication.
#[must_use]
pub fn select_reasons(window: &CorrelationWindow, categories: &[Category]) -> Vec<FailureReason> {
    window
        .records()
        .iter()
        .filter(|record| categories.iter().any(|category| category.matches(record)))
        .filter_map(EventRecord::reason_text)
        .map(FailureReason::from)
        .collect()
}

/// Errors raised by [`diagnose`].
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum DiagnoseError {
    /// Listing the event log failed.
    #[error("failed to list operation events: {0}")]
    Source(#[from] ProbeError),
    /// The event log could not be correlated.
    #[error(transparent)]
    Correlation(#[from] CorrelationError),
    /// The caller cancelled the diagnosis.
    #[error("failure diagnosis cancelled")]
    Cancelled,
}

/// Fetches the event log and returns the failure reasons recorded for the
/// operation identified by `token`.
///
/// An empty result is valid: the log held no matching detail.
///
/// # Errors
///
/// Returns [`DiagnoseError`] when listing fails, the log is not contiguous
/// for `token`, or `cancel` fires.
pub async fn diagnose<E>(
    source: &E,
    token: &str,
    categories: &[Category],
    cancel: &CancellationToken,
) -> Result<Vec<FailureReason>, DiagnoseError>
where
    E: EventSource + ?Sized,
{
    let events = tokio::select! {
        biased;
        () = cancel.cancelled() => return Err(DiagnoseError::Cancelled),
        listed = source.list_events() => listed?,
    };
    let window = correlate(&events, token)?;
    let reasons = select_reasons(&window, categories);
    debug!(
        token,
        listed = events.len(),
        window = window.records().len(),
        reasons = reasons.len(),
        "correlated operation events"
    );
    Ok(reasons)
}
