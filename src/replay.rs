//! JSON-backed collaborators that replay a recorded describe sequence or
//! event log.
//!
//! These drive the CLI and let a captured provider conversation be re-run
//! through the waiter and the correlator without network access.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use camino::Utf8Path;
use cap_std::{ambient_authority, fs_utf8::Dir};
use serde::Deserialize;
use thiserror::Error;

use crate::events::EventRecord;
use crate::probe::{EventSource, Observation, ProbeError, ProbeFuture, StatusProbe};

/// One recorded describe result.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordedObservation {
    /// The resource reported a status.
    Status {
        /// Reported status code.
        status: String,
        /// Explanation attached to the status.
        #[serde(default)]
        status_reason: Option<String>,
        /// Provider state object.
        #[serde(default)]
        state: serde_json::Value,
    },
    /// Nothing observable, without an error.
    Absent,
    /// The describe call failed with a not-found error.
    NotFound {
        /// Provider message.
        #[serde(default)]
        message: String,
    },
    /// The describe call failed for another reason.
    Error {
        /// Provider message.
        message: String,
    },
}

impl RecordedObservation {
    fn into_result(self) -> Result<Option<Observation<serde_json::Value>>, ProbeError> {
        match self {
            Self::Status {
                status,
                status_reason,
                state,
            } => Ok(Some(Observation {
                status,
                status_reason,
                state,
            })),
            Self::Absent => Ok(None),
            Self::NotFound { message } => Err(ProbeError::NotFound { message }),
            Self::Error { message } => Err(ProbeError::Request { message }),
        }
    }
}

/// Errors raised while loading a recording.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ReplayError {
    /// The recording could not be read.
    #[error("failed to read recording {path}: {message}")]
    Read {
        /// Path that was requested.
        path: String,
        /// Underlying I/O error message.
        message: String,
    },
    /// The recording is not valid JSON of the expected shape.
    #[error("failed to parse recording {path}: {message}")]
    Parse {
        /// Path, or `<inline>` for in-memory recordings.
        path: String,
        /// Deserializer error message.
        message: String,
    },
}

/// Status probe that serves recorded observations in order.
#[derive(Debug)]
pub struct RecordedProbe {
    queue: Mutex<VecDeque<RecordedObservation>>,
}

impl RecordedProbe {
    /// Builds a probe from already-decoded observations.
    #[must_use]
    pub fn new(observations: Vec<RecordedObservation>) -> Self {
        Self {
            queue: Mutex::new(observations.into()),
        }
    }

    /// Parses a JSON array of observations.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Parse`] when the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self, ReplayError> {
        parse(json, "<inline>").map(Self::new)
    }

    /// Reads and parses a recording file.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError`] when the file cannot be read or parsed.
    pub fn from_path(path: &Utf8Path) -> Result<Self, ReplayError> {
        let content = read_recording(path)?;
        parse(&content, path.as_str()).map(Self::new)
    }

    /// Number of observations not yet served.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl StatusProbe for RecordedProbe {
    type State = serde_json::Value;

    fn describe(&self) -> ProbeFuture<'_, Option<Observation<Self::State>>> {
        let next = self
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        let result = next.map_or_else(
            || {
                Err(ProbeError::Request {
                    message: String::from("recording exhausted"),
                })
            },
            RecordedObservation::into_result,
        );
        Box::pin(async move { result })
    }
}

/// Event source that serves one recorded listing.
#[derive(Clone, Debug, Default)]
pub struct RecordedEvents {
    events: Vec<EventRecord>,
}

impl RecordedEvents {
    /// Wraps already-decoded events.
    #[must_use]
    pub const fn new(events: Vec<EventRecord>) -> Self {
        Self { events }
    }

    /// Parses a JSON array of event records.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Parse`] when the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self, ReplayError> {
        parse(json, "<inline>").map(Self::new)
    }

    /// Reads and parses an event log file.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError`] when the file cannot be read or parsed.
    pub fn from_path(path: &Utf8Path) -> Result<Self, ReplayError> {
        let content = read_recording(path)?;
        parse(&content, path.as_str()).map(Self::new)
    }

    /// Recorded events in file order.
    #[must_use]
    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }
}

impl EventSource for RecordedEvents {
    fn list_events(&self) -> ProbeFuture<'_, Vec<EventRecord>> {
        let listing = self.events.clone();
        Box::pin(async move { Ok::<_, ProbeError>(listing) })
    }
}

fn parse<T>(json: &str, origin: &str) -> Result<T, ReplayError>
where
    T: for<'de> Deserialize<'de>,
{
    serde_json::from_str(json).map_err(|err| ReplayError::Parse {
        path: origin.to_owned(),
        message: err.to_string(),
    })
}

fn read_recording(path: &Utf8Path) -> Result<String, ReplayError> {
    read_to_string_ambient(path).map_err(|message| ReplayError::Read {
        path: path.to_string(),
        message,
    })
}

fn read_to_string_ambient(path: &Utf8Path) -> Result<String, String> {
    let (dir_path, file_path) = if path.is_absolute() {
        let parent = path
            .parent()
            .ok_or_else(|| format!("path has no parent directory: {path}"))?;
        let file_name = path
            .file_name()
            .ok_or_else(|| format!("path has no file name: {path}"))?;
        (parent, Utf8Path::new(file_name))
    } else {
        (Utf8Path::new("."), path)
    };

    let dir =
        Dir::open_ambient_dir(dir_path, ambient_authority()).map_err(|err| err.to_string())?;
    dir.read_to_string(file_path).map_err(|err| err.to_string())
}
