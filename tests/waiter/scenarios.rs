use rstest_bdd_macros::scenario;

use super::test_helpers::{WaiterWorld, waiter_world};

#[scenario(
    path = "tests/features/waiter.feature",
    name = "Creation reaches its target after pending polls"
)]
fn scenario_reaches_target(waiter_world: WaiterWorld) {
    let _ = waiter_world;
}

#[scenario(
    path = "tests/features/waiter.feature",
    name = "Absence within the tolerance is survived"
)]
fn scenario_absence_tolerated(waiter_world: WaiterWorld) {
    let _ = waiter_world;
}

#[scenario(
    path = "tests/features/waiter.feature",
    name = "Absence beyond the tolerance fails the wait"
)]
fn scenario_absence_exceeds_tolerance(waiter_world: WaiterWorld) {
    let _ = waiter_world;
}

#[scenario(
    path = "tests/features/waiter.feature",
    name = "A stuck operation times out"
)]
fn scenario_times_out(waiter_world: WaiterWorld) {
    let _ = waiter_world;
}

#[scenario(
    path = "tests/features/waiter.feature",
    name = "Deletion settles once the resource disappears"
)]
fn scenario_deletion_gone(waiter_world: WaiterWorld) {
    let _ = waiter_world;
}

#[scenario(
    path = "tests/features/waiter.feature",
    name = "A failure status ends the wait for diagnosis"
)]
fn scenario_failure_status(waiter_world: WaiterWorld) {
    let _ = waiter_world;
}
