//! Command-line interface definitions for the `stackwatch` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use clap::{Parser, ValueEnum};

/// Top-level CLI for the `stackwatch` binary.
#[derive(Debug, Parser)]
#[command(
    name = "stackwatch",
    about = "Wait on long-running cloud operations and explain why they failed",
    arg_required_else_help = true
)]
pub(crate) enum Cli {
    /// Drive the waiter over a recorded describe sequence.
    #[command(name = "replay", about = "Drive the waiter over a recorded describe sequence")]
    Replay(ReplayCommand),
    /// Correlate a recorded event log and print failure reasons.
    #[command(
        name = "diagnose",
        about = "Correlate a recorded event log and print failure reasons"
    )]
    Diagnose(DiagnoseCommand),
    /// Classify an error message as retryable or permanent.
    #[command(
        name = "classify",
        about = "Classify an error message as retryable or permanent"
    )]
    Classify(ClassifyCommand),
}

/// Arguments for the `stackwatch replay` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct ReplayCommand {
    /// JSON file holding the recorded observations, oldest first.
    #[arg(long, value_name = "PATH")]
    pub(crate) observations: String,
    /// Use the status sets and timing of a built-in operation profile
    /// (for example `stack-create` or `stack-delete`).
    #[arg(long, value_name = "NAME", conflicts_with_all = ["pending", "target"])]
    pub(crate) profile: Option<String>,
    /// Status meaning the operation is still running. Repeatable.
    #[arg(long, value_name = "STATUS")]
    pub(crate) pending: Vec<String>,
    /// Status meaning success. Repeatable; omit to wait until the resource
    /// is gone.
    #[arg(long, value_name = "STATUS")]
    pub(crate) target: Vec<String>,
    /// Deadline for the whole wait. Defaults to the configured timeout for
    /// the profile's operation kind, or the create timeout without one.
    #[arg(long, value_name = "SECONDS")]
    pub(crate) timeout_secs: Option<u64>,
    /// Consecutive target observations required.
    #[arg(long, value_name = "COUNT")]
    pub(crate) continuous: Option<u32>,
    /// Consecutive absences tolerated.
    #[arg(long, value_name = "COUNT")]
    pub(crate) not_found_tolerance: Option<u32>,
    /// Floor for the sleep between polls.
    #[arg(long, value_name = "MILLISECONDS")]
    pub(crate) min_poll_ms: Option<u64>,
    /// Fixed sleep between polls instead of exponential backoff.
    #[arg(long, value_name = "MILLISECONDS")]
    pub(crate) poll_interval_ms: Option<u64>,
}

/// Arguments for the `stackwatch diagnose` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct DiagnoseCommand {
    /// JSON file holding the recorded event log.
    #[arg(long, value_name = "PATH")]
    pub(crate) events: String,
    /// Operation token to correlate on.
    #[arg(long, value_name = "TOKEN")]
    pub(crate) token: String,
    /// Signal categories to report. Repeatable; defaults to `failed`.
    #[arg(long, value_enum, value_name = "CATEGORY")]
    pub(crate) category: Vec<CategoryArg>,
    /// Terminal status; when given, prints the composed failure message
    /// instead of one reason per line.
    #[arg(long, value_name = "STATUS")]
    pub(crate) status: Option<String>,
}

/// Arguments for the `stackwatch classify` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct ClassifyCommand {
    /// Error message returned by a mutating call.
    #[arg(required = true)]
    pub(crate) message: String,
}

/// Event categories accepted on the command line.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub(crate) enum CategoryArg {
    /// Resource steps that ended in a `*_FAILED` status.
    Failed,
    /// `ROLLBACK_*` steps.
    Rollback,
    /// The root stack starting to delete.
    Deletion,
}
