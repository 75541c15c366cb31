//! BDD step definitions for waiter behaviour.

use std::time::Duration;

use rstest_bdd_macros::{given, then, when};
use stackwatch::waiter::{WaitError, WaitOutcome};

use super::test_helpers::{StepError, WaitResult, WaiterWorld};

#[given("a waiter for \"{profile}\"")]
fn waiter_for(waiter_world: &WaiterWorld, profile: String) -> Result<(), StepError> {
    waiter_world.select(&profile)
}

#[given("the waiter tolerates \"{count}\" absences")]
fn waiter_tolerates(waiter_world: &WaiterWorld, count: u32) {
    waiter_world.tolerance.replace(Some(count));
}

#[given("the waiter gives up after \"{seconds}\" seconds")]
fn waiter_gives_up(waiter_world: &WaiterWorld, seconds: u64) {
    waiter_world.timeout.replace(Duration::from_secs(seconds));
}

#[given("the probe reports \"{status}\"")]
fn probe_reports(waiter_world: &WaiterWorld, status: String) {
    waiter_world.probe.push_status(&status);
}

#[given("the probe keeps reporting \"{status}\"")]
fn probe_keeps_reporting(waiter_world: &WaiterWorld, status: String) {
    waiter_world.probe.repeat_status(&status);
}

#[given("the resource is absent for \"{count}\" polls")]
fn resource_absent(waiter_world: &WaiterWorld, count: u32) {
    for _ in 0..count {
        waiter_world.probe.push_not_found();
    }
}

#[when("the waiter runs")]
fn waiter_runs(waiter_world: &WaiterWorld) -> Result<(), StepError> {
    waiter_world.run()
}

fn with_result<T>(
    waiter_world: &WaiterWorld,
    check: impl FnOnce(&WaitResult) -> Result<T, StepError>,
) -> Result<T, StepError> {
    let result = waiter_world.result.borrow();
    let outcome = result.as_ref().ok_or(StepError::NotRun)?;
    check(outcome)
}

#[then("the wait reaches \"{status}\"")]
fn wait_reaches(waiter_world: &WaiterWorld, status: String) -> Result<(), StepError> {
    with_result(waiter_world, |result| match result {
        Ok(WaitOutcome::Reached(observation)) if observation.status == status => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected to reach {status}, got {other:?}"
        ))),
    })
}

#[then("the probe was called \"{count}\" times")]
fn probe_called(waiter_world: &WaiterWorld, count: usize) -> Result<(), StepError> {
    let calls = waiter_world.probe.calls();
    if calls == count {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {count} describe calls, got {calls}"
        )))
    }
}

#[then("the wait fails with not found after \"{checks}\" checks")]
fn wait_not_found(waiter_world: &WaiterWorld, checks: u32) -> Result<(), StepError> {
    with_result(waiter_world, |result| match result {
        Err(WaitError::NotFound { checks: seen, .. }) if *seen == checks => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected not found after {checks} checks, got {other:?}"
        ))),
    })
}

#[then("the wait times out with last status \"{status}\"")]
fn wait_times_out(waiter_world: &WaiterWorld, status: String) -> Result<(), StepError> {
    with_result(waiter_world, |result| match result {
        Err(WaitError::TimedOut { last_status, .. })
            if last_status.as_deref() == Some(status.as_str()) =>
        {
            Ok(())
        }
        other => Err(StepError::Assertion(format!(
            "expected timeout at {status}, got {other:?}"
        ))),
    })
}

#[then("the resource is reported gone")]
fn resource_gone(waiter_world: &WaiterWorld) -> Result<(), StepError> {
    with_result(waiter_world, |result| match result {
        Ok(WaitOutcome::Gone) => Ok(()),
        other => Err(StepError::Assertion(format!("expected gone, got {other:?}"))),
    })
}

#[then("the wait ends unexpectedly with \"{status}\"")]
fn wait_unexpected(waiter_world: &WaiterWorld, status: String) -> Result<(), StepError> {
    with_result(waiter_world, |result| match result {
        Ok(WaitOutcome::Unexpected(observation)) if observation.status == status => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected unexpected {status}, got {other:?}"
        ))),
    })
}
