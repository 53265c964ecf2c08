//! A search running on its own worker thread, with a shared outcome that any
//! number of observers can poll.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use crate::error::Error;
use crate::oracle::HashOracle;
use crate::search::{self, CandidateSource, Mode, Search, SearchOutcome};

/// Longest candidate a generated-mode task will produce.
pub const DEFAULT_MAX_CANDIDATE_LEN: usize = 128;

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

/// Lifecycle of a task. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TaskState {
    Uninitialized,
    Running,
    Done,
}

/// Why a task reached [`TaskState::Done`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    Matched,
    Exhausted,
    Cancelled,
    /// The worker hit a runtime error; the message describes it.
    Failed(String),
}

/// Point-in-time view of a task's outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub state: TaskState,
    /// The matching candidate. Only present once done with a match.
    pub password: Option<String>,
    /// Only present once done.
    pub termination: Option<Termination>,
}

impl Snapshot {
    pub fn is_done(&self) -> bool {
        self.state == TaskState::Done
    }
}

/// Timing figures for a finished task.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Diagnostics {
    pub elapsed_seconds: f64,
    /// `stop - start + 1`, where `stop` is the matching index after a match.
    pub hashes_attempted: u64,
}

/// Everything a task needs to run.
#[derive(Debug, Clone)]
pub struct TaskConfig {
    pub start: u64,
    pub stop: u64,
    pub source: CandidateSource,
    pub target: Vec<u8>,
    pub salt: Vec<u8>,
    pub max_candidate_len: usize,
}

impl TaskConfig {
    pub fn new(
        start: u64,
        stop: u64,
        source: CandidateSource,
        target: impl Into<Vec<u8>>,
        salt: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            start,
            stop,
            source,
            target: target.into(),
            salt: salt.into(),
            max_candidate_len: DEFAULT_MAX_CANDIDATE_LEN,
        }
    }

    pub fn max_candidate_len(mut self, max: usize) -> Self {
        self.max_candidate_len = max;
        self
    }

    /// Checks the configuration without spawning anything.
    ///
    /// Generated candidate length is not checked here; the worker fails with
    /// [`Error::GeneratedPasswordTooLong`] only if it reaches such an index.
    pub fn validate(&self) -> Result<(), Error> {
        if self.start > self.stop {
            return Err(Error::InvalidArgument { reason: "start must not exceed stop" });
        }
        if self.target.is_empty() {
            return Err(Error::InvalidArgument { reason: "target digest must not be empty" });
        }
        if self.salt.is_empty() {
            return Err(Error::InvalidArgument { reason: "salt must not be empty" });
        }
        match &self.source {
            CandidateSource::Charset(charset) => {
                if charset.is_empty() {
                    return Err(Error::InvalidArgument { reason: "charset must not be empty" });
                }
            }
            CandidateSource::WordList(words) => {
                if words.is_empty() {
                    return Err(Error::InvalidArgument { reason: "word list must not be empty" });
                }
                if self.stop >= words.len() as u64 {
                    return Err(Error::InvalidArgument {
                        reason: "stop is past the end of the word list",
                    });
                }
            }
        }
        Ok(())
    }
}

/// The fields written by the worker when it finishes. Always written together,
/// under one lock, exactly once.
#[derive(Debug)]
struct Outcome {
    state: TaskState,
    password: Option<String>,
    stop: u64,
    termination: Option<Termination>,
    finished_at: Option<Instant>,
}

#[derive(Debug)]
struct Shared {
    outcome: Mutex<Outcome>,
    cancel: CancellationToken,
}

impl Shared {
    // The outcome is replaced as a whole, so a poisoned lock still guards a
    // consistent value.
    fn lock(&self) -> MutexGuard<'_, Outcome> {
        self.outcome.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle to a search running in the background.
///
/// The worker starts before [`Task::spawn`] returns. Dropping the handle while
/// the worker is still running requests cancellation.
#[derive(Debug)]
pub struct Task {
    id: u64,
    start: u64,
    mode: Mode,
    started_at: Instant,
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Task {
    /// Positional constructor: exactly one of `word_list` and `charset` must
    /// be non-empty.
    pub fn create<O: HashOracle>(
        start: u64,
        stop: u64,
        word_list: Vec<String>,
        charset: &str,
        target: &[u8],
        salt: &[u8],
        oracle: O,
    ) -> Result<Self, Error> {
        let source = match (word_list.is_empty(), charset.is_empty()) {
            (false, true) => CandidateSource::WordList(word_list),
            (true, false) => CandidateSource::Charset(charset.chars().collect()),
            (true, true) => {
                return Err(Error::InvalidArgument {
                    reason: "either a word list or a charset is required",
                });
            }
            (false, false) => {
                return Err(Error::InvalidArgument {
                    reason: "a word list and a charset are mutually exclusive",
                });
            }
        };
        Self::spawn(TaskConfig::new(start, stop, source, target, salt), oracle)
    }

    /// Validates `config` and starts the worker. On error nothing is spawned.
    pub fn spawn<O: HashOracle>(config: TaskConfig, mut oracle: O) -> Result<Self, Error> {
        config.validate()?;

        let id = NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed);
        let (start, stop, mode) = (config.start, config.stop, config.source.mode());
        let shared = Arc::new(Shared {
            outcome: Mutex::new(Outcome {
                state: TaskState::Uninitialized,
                password: None,
                stop,
                termination: None,
                finished_at: None,
            }),
            cancel: CancellationToken::new(),
        });

        // Running must be visible before the worker can publish Done.
        shared.lock().state = TaskState::Running;
        let started_at = Instant::now();

        let worker_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name(format!("brutus-worker-{id}"))
            .spawn(move || {
                let teardown =
                    Teardown { task: id, shared: worker_shared, config: Some(config) };
                let result = match teardown.config.as_ref() {
                    Some(config) => {
                        let query = Search {
                            source: &config.source,
                            target: &config.target,
                            salt: &config.salt,
                            start: config.start,
                            stop: config.stop,
                            max_candidate_len: config.max_candidate_len,
                        };
                        search::run(&query, &mut oracle, &teardown.shared.cancel)
                    }
                    None => Ok(SearchOutcome::Cancelled),
                };
                teardown.finish(result);
            })
            .map_err(Error::Spawn)?;

        tracing::info!(task = id, start, stop, ?mode, "spawned search worker");

        Ok(Self { id, start, mode, started_at, shared, worker: Mutex::new(Some(handle)) })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Returns the current `(state, password, termination)` without waiting.
    pub fn poll(&self) -> Snapshot {
        let outcome = self.shared.lock();
        Snapshot {
            state: outcome.state,
            password: outcome.password.clone(),
            termination: outcome.termination.clone(),
        }
    }

    pub fn is_done(&self) -> bool {
        self.shared.lock().state == TaskState::Done
    }

    /// Asks the worker to stop at its next checkpoint.
    ///
    /// Returns `false` if the task is already done. Completion is observed
    /// later through [`Task::poll`].
    pub fn cancel(&self) -> bool {
        self.try_cancel().is_ok()
    }

    /// Like [`Task::cancel`], but reports a finished task as
    /// [`Error::CancellationIgnored`].
    pub fn try_cancel(&self) -> Result<(), Error> {
        let outcome = self.shared.lock();
        if outcome.state == TaskState::Done {
            return Err(Error::CancellationIgnored);
        }
        self.shared.cancel.cancel();
        tracing::debug!(task = self.id, "cancellation requested");
        Ok(())
    }

    /// Elapsed time and hash count of a finished task.
    pub fn diagnostics(&self) -> Result<Diagnostics, Error> {
        let outcome = self.shared.lock();
        let (TaskState::Done, Some(finished_at)) = (outcome.state, outcome.finished_at) else {
            return Err(Error::NotDone);
        };
        Ok(Diagnostics {
            elapsed_seconds: finished_at.duration_since(self.started_at).as_secs_f64(),
            // Saturates only for a task spanning all 2^64 indices.
            hashes_attempted: (outcome.stop - self.start).saturating_add(1),
        })
    }

    /// Blocks until the worker thread has exited and returns the final
    /// snapshot. Later calls return immediately.
    pub fn wait(&self) -> Snapshot {
        let handle = self.worker.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(handle) = handle {
            // A panicking worker has already published through `Teardown::drop`.
            if handle.join().is_err() {
                tracing::warn!(task = self.id, "search worker panicked");
            }
        }
        self.poll()
    }
}

impl Drop for Task {
    fn drop(&mut self) {
        self.shared.cancel.cancel();
    }
}

/// Owns the worker's buffers. Every exit path, including unwinding, goes
/// through `release`, which publishes the outcome and frees the buffers once.
struct Teardown {
    task: u64,
    shared: Arc<Shared>,
    config: Option<TaskConfig>,
}

impl Teardown {
    fn finish(mut self, result: Result<SearchOutcome, Error>) {
        let (termination, matched) = match result {
            Ok(SearchOutcome::Matched { index, password }) => {
                tracing::info!(task = self.task, index, "found matching candidate");
                (Termination::Matched, Some((index, password)))
            }
            Ok(SearchOutcome::Exhausted) => {
                tracing::info!(task = self.task, "range exhausted without a match");
                (Termination::Exhausted, None)
            }
            Ok(SearchOutcome::Cancelled) => {
                tracing::info!(task = self.task, "search cancelled");
                (Termination::Cancelled, None)
            }
            Err(e) => {
                tracing::warn!(task = self.task, error = %e, "search failed");
                (Termination::Failed(e.to_string()), None)
            }
        };
        self.release(termination, matched);
    }

    fn release(&mut self, termination: Termination, matched: Option<(u64, String)>) {
        let Some(config) = self.config.take() else {
            return;
        };

        {
            let mut outcome = self.shared.lock();
            outcome.state = TaskState::Done;
            outcome.termination = Some(termination);
            outcome.finished_at = Some(Instant::now());
            if let Some((index, password)) = matched {
                outcome.stop = index;
                outcome.password = Some(password);
            }
        }

        drop(config);
        tracing::debug!(task = self.task, "released candidate buffers");
    }
}

impl Drop for Teardown {
    fn drop(&mut self) {
        if self.config.is_some() {
            self.release(Termination::Failed("search worker panicked".to_string()), None);
        }
    }
}
