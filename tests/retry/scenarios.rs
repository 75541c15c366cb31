use rstest_bdd_macros::scenario;

use super::test_helpers::{RetryWorld, retry_world};

#[scenario(
    path = "tests/features/retry.feature",
    name = "Propagation errors are retried until the call succeeds"
)]
fn scenario_retries_until_success(retry_world: RetryWorld) {
    let _ = retry_world;
}

#[scenario(
    path = "tests/features/retry.feature",
    name = "Permanent errors are not retried"
)]
fn scenario_permanent_error(retry_world: RetryWorld) {
    let _ = retry_world;
}

#[scenario(
    path = "tests/features/retry.feature",
    name = "Retrying stops when the budget runs out"
)]
fn scenario_budget_exhausted(retry_world: RetryWorld) {
    let _ = retry_world;
}
