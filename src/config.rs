//! Configuration loading via `ortho-config`.

use std::ffi::OsString;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::operations::TimeoutKind;
use crate::retry::RetryPolicy;
use crate::waiter::{WaiterSpec, WaiterSpecBuilder};

/// Waiting and retry defaults layered from `stackwatch.toml`, `STACKWATCH_*`
/// environment variables, and CLI flags.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "STACKWATCH",
    discovery(
        app_name = "stackwatch",
        env_var = "STACKWATCH_CONFIG_PATH",
        config_file_name = "stackwatch.toml",
        dotfile_name = ".stackwatch.toml",
        project_file_name = "stackwatch.toml"
    )
)]
pub struct WaitConfig {
    /// Deadline for create waits, in seconds.
    #[ortho_config(default = 4500)]
    pub create_timeout_secs: u64,
    /// Deadline for update waits, in seconds.
    #[ortho_config(default = 4500)]
    pub update_timeout_secs: u64,
    /// Deadline for delete waits, in seconds.
    #[ortho_config(default = 4500)]
    pub delete_timeout_secs: u64,
    /// Floor for the sleep between polls, in milliseconds.
    #[ortho_config(default = 0)]
    pub min_poll_interval_ms: u64,
    /// Sleep before the first poll, in milliseconds.
    #[ortho_config(default = 0)]
    pub initial_delay_ms: u64,
    /// Consecutive absences tolerated before a wait fails.
    #[ortho_config(default = 20)]
    pub not_found_tolerance: u32,
    /// Consecutive target observations required to settle.
    #[ortho_config(default = 1)]
    pub continuous_target_occurrences: u32,
    /// Budget for retrying mutating calls through propagation errors, in
    /// seconds.
    #[ortho_config(default = 120)]
    pub propagation_timeout_secs: u64,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }
}

impl WaitConfig {
    fn require_positive(value: u64, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value == 0 {
            return Err(ConfigError::Invalid(format!(
                "{} must be greater than zero: set {} or {} in stackwatch.toml",
                metadata.description, metadata.env_var, metadata.toml_key
            )));
        }
        Ok(())
    }

    /// Loads configuration from defaults, configuration files, and
    /// environment variables without attempting to parse CLI arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([OsString::from("stackwatch")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Rejects values the waiter cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the offending environment
    /// variable and TOML key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::require_positive(
            self.create_timeout_secs,
            &FieldMetadata::new(
                "create timeout",
                "STACKWATCH_CREATE_TIMEOUT_SECS",
                "create_timeout_secs",
            ),
        )?;
        Self::require_positive(
            self.update_timeout_secs,
            &FieldMetadata::new(
                "update timeout",
                "STACKWATCH_UPDATE_TIMEOUT_SECS",
                "update_timeout_secs",
            ),
        )?;
        Self::require_positive(
            self.delete_timeout_secs,
            &FieldMetadata::new(
                "delete timeout",
                "STACKWATCH_DELETE_TIMEOUT_SECS",
                "delete_timeout_secs",
            ),
        )?;
        Self::require_positive(
            u64::from(self.continuous_target_occurrences),
            &FieldMetadata::new(
                "continuous target occurrences",
                "STACKWATCH_CONTINUOUS_TARGET_OCCURRENCES",
                "continuous_target_occurrences",
            ),
        )?;
        Ok(())
    }

    /// Deadline for create waits.
    #[must_use]
    pub const fn create_timeout(&self) -> Duration {
        Duration::from_secs(self.create_timeout_secs)
    }

    /// Deadline for update waits.
    #[must_use]
    pub const fn update_timeout(&self) -> Duration {
        Duration::from_secs(self.update_timeout_secs)
    }

    /// Deadline for delete waits.
    #[must_use]
    pub const fn delete_timeout(&self) -> Duration {
        Duration::from_secs(self.delete_timeout_secs)
    }

    /// Deadline for waits of the given kind.
    #[must_use]
    pub const fn timeout(&self, kind: TimeoutKind) -> Duration {
        match kind {
            TimeoutKind::Create => self.create_timeout(),
            TimeoutKind::Update => self.update_timeout(),
            TimeoutKind::Delete => self.delete_timeout(),
        }
    }

    /// Retry policy for mutating calls.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(Duration::from_secs(self.propagation_timeout_secs))
    }

    /// Builds a spec builder prefilled with the configured timing.
    #[must_use]
    pub fn spec_builder<P, T, S, U>(&self, pending: P, target: T, timeout: Duration) -> WaiterSpecBuilder
    where
        P: IntoIterator<Item = S>,
        S: Into<String>,
        T: IntoIterator<Item = U>,
        U: Into<String>,
    {
        WaiterSpec::builder(timeout)
            .pending(pending)
            .target(target)
            .min_poll_interval(Duration::from_millis(self.min_poll_interval_ms))
            .initial_delay(Duration::from_millis(self.initial_delay_ms))
            .not_found_tolerance(self.not_found_tolerance)
            .continuous_target_occurrences(self.continuous_target_occurrences)
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// A value is outside the range the waiter accepts.
    #[error("invalid configuration: {0}")]
    Invalid(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}
