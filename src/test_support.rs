//! Test support utilities shared across unit and integration tests.

use std::collections::{BTreeSet, VecDeque};
use std::env;
use std::ffi::OsString;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, MutexGuard};

use crate::events::EventRecord;
use crate::probe::{
    EventSource, Observation, OperationResult, OperationResultSource, ProbeError, ProbeFuture,
    StatusProbe,
};

type Scripted<S> = Result<Option<Observation<S>>, ProbeError>;

/// Scripted status probe that returns pre-seeded observations in FIFO order.
///
/// Once the queue drains the optional fallback is returned forever; without
/// one, the probe fails with [`ProbeError::Request`].
#[derive(Clone, Debug)]
pub struct ScriptedProbe<S = ()> {
    responses: Arc<Mutex<VecDeque<Scripted<S>>>>,
    fallback: Arc<Mutex<Option<Scripted<S>>>>,
    calls: Arc<AtomicUsize>,
}

impl<S> Default for ScriptedProbe<S> {
    fn default() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            fallback: Arc::new(Mutex::new(None)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl<S> ScriptedProbe<S>
where
    S: Clone + Default,
{
    /// Creates a probe with no queued responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many describe calls were made.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Queues an observation carrying `status` and a default state.
    pub fn push_status(&self, status: &str) {
        self.push(Ok(Some(Observation::new(status, S::default()))));
    }

    /// Queues one observation per status.
    pub fn push_statuses(&self, statuses: &[&str]) {
        for status in statuses {
            self.push_status(status);
        }
    }

    /// Queues a full observation.
    pub fn push_observation(&self, observation: Observation<S>) {
        self.push(Ok(Some(observation)));
    }

    /// Queues an absence without an error.
    pub fn push_absent(&self) {
        self.push(Ok(None));
    }

    /// Queues a typed not-found error.
    pub fn push_not_found(&self) {
        self.push(Err(ProbeError::NotFound {
            message: String::from("simulated absence"),
        }));
    }

    /// Queues a fatal request error.
    pub fn push_error(&self, message: &str) {
        self.push(Err(ProbeError::Request {
            message: message.to_owned(),
        }));
    }

    /// Returns `status` forever once the queue drains.
    pub fn repeat_status(&self, status: &str) {
        *self.fallback.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(Ok(Some(Observation::new(status, S::default()))));
    }

    fn push(&self, response: Scripted<S>) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(response);
    }

    fn next(&self) -> Scripted<S> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let queued = self
            .responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        queued
            .or_else(|| {
                self.fallback
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .clone()
            })
            .unwrap_or_else(|| {
                Err(ProbeError::Request {
                    message: String::from("no scripted observation available"),
                })
            })
    }
}

impl<S> StatusProbe for ScriptedProbe<S>
where
    S: Clone + Default + Send + 'static,
{
    type State = S;

    fn describe(&self) -> ProbeFuture<'_, Option<Observation<S>>> {
        let response = self.next();
        Box::pin(async move { response })
    }
}

/// Scripted event source returning a fixed listing.
#[derive(Clone, Debug)]
pub struct ScriptedEvents {
    events: Arc<Mutex<Result<Vec<EventRecord>, ProbeError>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedEvents {
    /// Creates a source serving `events`.
    #[must_use]
    pub fn new(events: Vec<EventRecord>) -> Self {
        Self {
            events: Arc::new(Mutex::new(Ok(events))),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Creates a source whose listing always fails with `message`.
    #[must_use]
    pub fn failing(message: &str) -> Self {
        Self {
            events: Arc::new(Mutex::new(Err(ProbeError::Request {
                message: message.to_owned(),
            }))),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Returns how many listings were requested.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for ScriptedEvents {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl EventSource for ScriptedEvents {
    fn list_events(&self) -> ProbeFuture<'_, Vec<EventRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let listing = self
            .events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        Box::pin(async move { listing })
    }
}

/// Scripted per-target result listing.
#[derive(Clone, Debug, Default)]
pub struct ScriptedResults {
    results: Vec<OperationResult>,
}

impl ScriptedResults {
    /// Creates an empty listing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one result.
    #[must_use]
    pub fn with_result(mut self, account: &str, region: &str, status: &str, reason: &str) -> Self {
        self.results.push(OperationResult {
            account: account.to_owned(),
            region: region.to_owned(),
            status: status.to_owned(),
            status_reason: Some(reason.to_owned()),
        });
        self
    }
}

impl OperationResultSource for ScriptedResults {
    fn list_results(&self) -> ProbeFuture<'_, Vec<OperationResult>> {
        let listing = self.results.clone();
        Box::pin(async move { Ok::<_, ProbeError>(listing) })
    }
}

/// Global mutex used to serialise environment mutation in tests.
pub static ENV_LOCK: AsyncMutex<()> = AsyncMutex::const_new(());

/// Guard that holds the env mutex and cleans up variables on drop.
pub struct EnvGuard {
    previous: Vec<(String, Option<OsString>)>,
    _guard: MutexGuard<'static, ()>,
}

impl EnvGuard {
    /// Sets multiple environment variables while holding a global mutex.
    pub async fn set_vars(pairs: &[(&str, &str)]) -> Self {
        debug_assert!(
            {
                let mut seen = BTreeSet::new();
                pairs.iter().all(|(key, _)| seen.insert(*key))
            },
            "duplicate environment variable keys passed to EnvGuard::set_vars"
        );

        let guard = ENV_LOCK.lock().await;
        let mut previous = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            let old = env::var_os(key);
            // SAFETY: Environment mutation is serialised by `ENV_LOCK`, preventing races.
            unsafe { env::set_var(key, value) };
            previous.push(((*key).to_owned(), old));
        }

        Self {
            previous,
            _guard: guard,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, old) in &self.previous {
            // SAFETY: Environment mutation is serialised by holding `_guard`.
            unsafe {
                match old {
                    Some(val) => env::set_var(key, val),
                    None => env::remove_var(key),
                }
            }
        }
    }
}
