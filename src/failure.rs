//! Composition of a terminal status and correlated reasons into one
//! user-facing error.
//!
//! This is the only place that formats diagnostic text; the waiter and the
//! correlator hand over structured data.

use std::fmt;

use thiserror::Error;

/// One human-readable failure reason.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FailureReason {
    text: String,
}

impl FailureReason {
    /// Wraps reason text.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Returns the reason text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl From<&str> for FailureReason {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for FailureReason {
    fn from(value: String) -> Self {
        Self { text: value }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// A long-running operation settled in a failure status.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("operation failed with status {status}{}", render_reasons(.reasons))]
pub struct OperationFailed {
    /// Terminal status reported by the provider.
    pub status: String,
    /// Correlated reasons, oldest first. May be empty.
    pub reasons: Vec<FailureReason>,
}

impl OperationFailed {
    /// Returns the reason texts in order.
    #[must_use]
    pub fn reason_texts(&self) -> Vec<&str> {
        self.reasons.iter().map(FailureReason::text).collect()
    }
}

/// Builds the diagnostic error for a failed operation.
///
/// The message names the terminal status followed by the quoted reasons in
/// order; with no reasons it names the status alone.
#[must_use]
pub fn build(status: impl Into<String>, reasons: Vec<FailureReason>) -> OperationFailed {
    OperationFailed {
        status: status.into(),
        reasons,
    }
}

fn render_reasons(reasons: &[FailureReason]) -> String {
    if reasons.is_empty() {
        return String::new();
    }
    let quoted = reasons
        .iter()
        .map(|reason| format!("{:?}", reason.text()))
        .collect::<Vec<_>>()
        .join(", ");
    format!(": [{quoted}]")
}
