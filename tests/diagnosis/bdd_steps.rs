//! BDD step definitions for failure diagnosis.

use rstest_bdd_macros::{given, then, when};
use stackwatch::events::Category;
use stackwatch::failure;

use super::test_helpers::{DiagnosisWorld, StepError, interleaved_log};

#[given("an event log where update \"{older}\" failed before create \"{newer}\"")]
fn event_log(diagnosis_world: &DiagnosisWorld, older: String, newer: String) {
    diagnosis_world
        .events
        .replace(interleaved_log(&older, &newer));
}

#[given("the event log is listed newest first")]
fn newest_first(diagnosis_world: &DiagnosisWorld) {
    diagnosis_world.events.borrow_mut().reverse();
}

#[given("rollback signals are requested")]
fn rollback_requested(diagnosis_world: &DiagnosisWorld) {
    diagnosis_world
        .categories
        .replace(vec![Category::Failed, Category::Rollback]);
}

#[when("failures are diagnosed for token \"{token}\"")]
fn diagnose_token(diagnosis_world: &DiagnosisWorld, token: String) -> Result<(), StepError> {
    diagnosis_world.diagnose(&token)
}

#[then("the reasons are \"{expected}\"")]
fn reasons_are(diagnosis_world: &DiagnosisWorld, expected: String) -> Result<(), StepError> {
    let actual = diagnosis_world.reason_texts()?.join("; ");
    if actual == expected {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected reasons `{expected}`, got `{actual}`"
        )))
    }
}

#[then("no reasons are found")]
fn no_reasons(diagnosis_world: &DiagnosisWorld) -> Result<(), StepError> {
    let actual = diagnosis_world.reason_texts()?;
    if actual.is_empty() {
        Ok(())
    } else {
        Err(StepError::Assertion(format!("expected no reasons, got {actual:?}")))
    }
}

#[then("the failure message names status \"{status}\" and \"{count}\" reasons")]
fn failure_message(
    diagnosis_world: &DiagnosisWorld,
    status: String,
    count: usize,
) -> Result<(), StepError> {
    let reasons = diagnosis_world
        .reasons
        .borrow()
        .clone()
        .ok_or(StepError::NotRun)?;
    let error = failure::build(status.clone(), reasons);
    let message = error.to_string();

    if !message.starts_with(&format!("operation failed with status {status}")) {
        return Err(StepError::Assertion(format!(
            "message should name {status}: {message}"
        )));
    }
    if error.reasons.len() != count {
        return Err(StepError::Assertion(format!(
            "expected {count} reasons in `{message}`"
        )));
    }
    if count == 0 && message.contains('[') {
        return Err(StepError::Assertion(format!(
            "message without reasons should name the status alone: {message}"
        )));
    }
    Ok(())
}
