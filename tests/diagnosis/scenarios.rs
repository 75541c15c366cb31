use rstest_bdd_macros::scenario;

use super::test_helpers::{DiagnosisWorld, diagnosis_world};

#[scenario(
    path = "tests/features/diagnosis.feature",
    name = "Reasons come from the failing operation only"
)]
fn scenario_isolates_operation(diagnosis_world: DiagnosisWorld) {
    let _ = diagnosis_world;
}

#[scenario(
    path = "tests/features/diagnosis.feature",
    name = "Newest-first listings give the same reasons"
)]
fn scenario_newest_first(diagnosis_world: DiagnosisWorld) {
    let _ = diagnosis_world;
}

#[scenario(
    path = "tests/features/diagnosis.feature",
    name = "Rollback signals are reported on request"
)]
fn scenario_rollback_signals(diagnosis_world: DiagnosisWorld) {
    let _ = diagnosis_world;
}

#[scenario(
    path = "tests/features/diagnosis.feature",
    name = "A failed operation names its status and reasons"
)]
fn scenario_failure_message(diagnosis_world: DiagnosisWorld) {
    let _ = diagnosis_world;
}

#[scenario(
    path = "tests/features/diagnosis.feature",
    name = "An unknown token leaves the status alone in the message"
)]
fn scenario_unknown_token(diagnosis_world: DiagnosisWorld) {
    let _ = diagnosis_world;
}
