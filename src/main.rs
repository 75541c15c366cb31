//! Binary entry point for the stackwatch CLI.

use std::io::{self, Write};
use std::process;
use std::time::Duration;

use camino::Utf8Path;
use clap::Parser;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use stackwatch::config::{ConfigError, WaitConfig};
use stackwatch::events::{self, Category, DiagnoseError};
use stackwatch::failure;
use stackwatch::operations::{self, OperationProfile, TimeoutKind};
use stackwatch::probe::AbsentOn;
use stackwatch::replay::{RecordedEvents, RecordedProbe, ReplayError};
use stackwatch::retry::is_propagation_message;
use stackwatch::waiter::{self, SpecError, WaitError, WaitOutcome, WaiterSpecBuilder};

mod cli;

use cli::{CategoryArg, ClassifyCommand, Cli, DiagnoseCommand, ReplayCommand};

/// Environment variable holding the log filter.
const LOG_ENV: &str = "STACKWATCH_LOG";
const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("unknown operation profile: {0}")]
    UnknownProfile(String),
    #[error("invalid waiter settings: {0}")]
    Spec(#[from] SpecError),
    #[error(transparent)]
    Replay(#[from] ReplayError),
    #[error("wait failed: {0}")]
    Wait(#[from] WaitError),
    #[error("diagnosis failed: {0}")]
    Diagnose(#[from] DiagnoseError),
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let exit_code = match dispatch(cli).await {
        Ok(code) => code,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
        .ok();
}

async fn dispatch(cli: Cli) -> Result<i32, CliError> {
    match cli {
        Cli::Replay(command) => replay(command).await,
        Cli::Diagnose(command) => diagnose(command).await,
        Cli::Classify(command) => classify(&command, io::stdout().lock()),
    }
}

async fn replay(args: ReplayCommand) -> Result<i32, CliError> {
    let config = WaitConfig::load_without_cli_args()?;
    config.validate()?;
    let profile = args
        .profile
        .as_deref()
        .map(|name| {
            operations::profile(name).ok_or_else(|| CliError::UnknownProfile(name.to_owned()))
        })
        .transpose()?;
    let timeout = replay_timeout(&args, &config, profile.as_ref());

    let (builder, absent_on) = match profile {
        Some(found) => {
            let builder = found
                .spec_builder(timeout)
                .not_found_tolerance(config.not_found_tolerance)
                .continuous_target_occurrences(config.continuous_target_occurrences);
            (builder, found.absent_on)
        }
        None => (
            config.spec_builder(args.pending.iter().cloned(), args.target.iter().cloned(), timeout),
            &[][..],
        ),
    };
    let spec = apply_overrides(builder, &args).build()?;

    let recording = RecordedProbe::from_path(Utf8Path::new(&args.observations))?;
    let probe = AbsentOn::new(recording, absent_on.iter().copied());
    let cancel = cancel_on_interrupt();
    debug!(observations = %args.observations, "replaying recorded observations");

    let outcome = waiter::wait(&probe, &spec, &cancel).await?;
    render_outcome(&outcome, io::stdout().lock())
}

/// `--timeout-secs` wins; otherwise the profile's configured deadline, or the
/// create deadline for ad-hoc status sets.
fn replay_timeout(
    args: &ReplayCommand,
    config: &WaitConfig,
    profile: Option<&OperationProfile>,
) -> Duration {
    args.timeout_secs.map_or_else(
        || config.timeout(profile.map_or(TimeoutKind::Create, |found| found.timeout)),
        Duration::from_secs,
    )
}

fn apply_overrides(mut builder: WaiterSpecBuilder, args: &ReplayCommand) -> WaiterSpecBuilder {
    if let Some(count) = args.continuous {
        builder = builder.continuous_target_occurrences(count);
    }
    if let Some(count) = args.not_found_tolerance {
        builder = builder.not_found_tolerance(count);
    }
    if let Some(millis) = args.min_poll_ms {
        builder = builder.min_poll_interval(Duration::from_millis(millis));
    }
    builder.poll_interval(args.poll_interval_ms.map(Duration::from_millis))
}

fn render_outcome<S>(outcome: &WaitOutcome<S>, mut out: impl Write) -> Result<i32, CliError> {
    match outcome {
        WaitOutcome::Reached(observation) => {
            writeln!(out, "reached {}", observation.status)?;
            Ok(0)
        }
        WaitOutcome::Gone => {
            writeln!(out, "gone")?;
            Ok(0)
        }
        WaitOutcome::Unexpected(observation) => {
            match observation.status_reason.as_deref() {
                Some(reason) => writeln!(out, "unexpected {}: {reason}", observation.status)?,
                None => writeln!(out, "unexpected {}", observation.status)?,
            }
            Ok(1)
        }
    }
}

async fn diagnose(args: DiagnoseCommand) -> Result<i32, CliError> {
    let source = RecordedEvents::from_path(Utf8Path::new(&args.events))?;
    let categories = selected_categories(&args.category);
    let reasons = events::diagnose(&source, &args.token, &categories, &cancel_on_interrupt()).await?;

    let mut out = io::stdout().lock();
    match args.status {
        Some(status) => writeln!(out, "{}", failure::build(status, reasons))?,
        None => {
            for reason in &reasons {
                writeln!(out, "{reason}")?;
            }
        }
    }
    Ok(0)
}

fn selected_categories(args: &[CategoryArg]) -> Vec<Category> {
    if args.is_empty() {
        return vec![Category::Failed];
    }
    args.iter()
        .map(|arg| match arg {
            CategoryArg::Failed => Category::Failed,
            CategoryArg::Rollback => Category::Rollback,
            CategoryArg::Deletion => Category::Deletion,
        })
        .collect()
}

fn classify(args: &ClassifyCommand, mut out: impl Write) -> Result<i32, CliError> {
    let verdict = if is_propagation_message(&args.message) {
        "retryable"
    } else {
        "permanent"
    };
    writeln!(out, "{verdict}")?;
    Ok(0)
}

/// Returns a token cancelled on Ctrl-C so an interrupted wait reports
/// `Cancelled` rather than dying mid-poll.
fn cancel_on_interrupt() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });
    cancel
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
