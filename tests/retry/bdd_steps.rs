//! BDD step definitions for mutating-call retries.

use std::collections::HashSet;

use rstest_bdd_macros::{given, then, when};
use stackwatch::retry::RetryError;
use stackwatch::types::TOKEN_PREFIX;

use super::test_helpers::{RetryWorld, StepError, budget};

#[given("a call that fails \"{count}\" times with \"{message}\"")]
fn failing_call(retry_world: &RetryWorld, count: u32, message: String) {
    retry_world.failures.replace(count);
    retry_world.message.replace(message);
}

#[given("a retry budget of \"{seconds}\" seconds")]
fn retry_budget(retry_world: &RetryWorld, seconds: u64) {
    retry_world.policy.replace(budget(seconds));
}

#[when("the call is submitted")]
fn call_submitted(retry_world: &RetryWorld) -> Result<(), StepError> {
    retry_world.submit()
}

#[then("the call succeeds after \"{attempts}\" attempts")]
fn call_succeeds(retry_world: &RetryWorld, attempts: u32) -> Result<(), StepError> {
    let result = retry_world.result.borrow();
    match result.as_ref().ok_or(StepError::NotRun)? {
        Ok(submitted) if submitted.value == attempts => {
            let last = retry_world.tokens.borrow().last().cloned();
            if last.as_ref() == Some(&submitted.token) {
                Ok(())
            } else {
                Err(StepError::Assertion(String::from(
                    "returned token should be the one the successful attempt used",
                )))
            }
        }
        other => Err(StepError::Assertion(format!(
            "expected success on attempt {attempts}, got {other:?}"
        ))),
    }
}

#[then("every attempt used a fresh token")]
fn fresh_tokens(retry_world: &RetryWorld) -> Result<(), StepError> {
    let tokens = retry_world.tokens.borrow();
    let distinct: HashSet<&str> = tokens.iter().map(|token| token.as_str()).collect();
    if distinct.len() != tokens.len() {
        return Err(StepError::Assertion(format!("tokens were reused: {tokens:?}")));
    }
    if !tokens.iter().all(|token| token.as_str().starts_with(TOKEN_PREFIX)) {
        return Err(StepError::Assertion(format!(
            "tokens should carry the {TOKEN_PREFIX} prefix: {tokens:?}"
        )));
    }
    Ok(())
}

#[then("the call fails permanently after \"{attempts}\" attempts")]
fn call_fails_permanently(retry_world: &RetryWorld, attempts: usize) -> Result<(), StepError> {
    let result = retry_world.result.borrow();
    match result.as_ref().ok_or(StepError::NotRun)? {
        Err(RetryError::Permanent(_)) if retry_world.attempts() == attempts => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected a permanent failure after {attempts} attempts, got {other:?} after {}",
            retry_world.attempts()
        ))),
    }
}

#[then("the retry budget is exhausted")]
fn budget_exhausted(retry_world: &RetryWorld) -> Result<(), StepError> {
    let result = retry_world.result.borrow();
    match result.as_ref().ok_or(StepError::NotRun)? {
        Err(RetryError::TimedOut { attempts, .. })
            if usize::try_from(*attempts).ok() == Some(retry_world.attempts()) =>
        {
            Ok(())
        }
        other => Err(StepError::Assertion(format!(
            "expected the budget to run out, got {other:?}"
        ))),
    }
}
