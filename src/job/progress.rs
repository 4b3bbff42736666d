//! Progress observation and poll-able snapshots.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::job::manager::JobResult;

/// Lifecycle stage of a morph job, as observed through the polling surface.
///
/// Serialized names are a stable contract (`"morph"`, `"gradcam"`, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Resolving and normalizing the two source images.
    Loading,
    /// Running the correspondence provider and picking the synthesis mode.
    Detecting,
    /// Synthesizing morph frames (one update per frame).
    Morph,
    /// Streaming frames into the video encoder.
    Encoding,
    /// Per-frame attention analysis (one update per frame).
    Gradcam,
    /// Terminal: job finished, `result` is populated.
    Complete,
    /// Terminal: job failed, `error` is populated.
    Error,
}

impl Stage {
    /// Return `true` for the two terminal stages.
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Complete | Stage::Error)
    }
}

/// One immutable progress record.
///
/// The board replaces the whole snapshot on every update; a polling reader
/// either sees the previous record or this one, never a partial write.
#[derive(Clone, Debug, serde::Serialize)]
pub struct Snapshot {
    /// Progress numerator within the current stage.
    pub current: u64,
    /// Progress denominator within the current stage.
    pub total: u64,
    /// Current lifecycle stage.
    pub stage: Stage,
    /// Populated only in the terminal `Complete` snapshot.
    pub result: Option<JobResult>,
    /// Populated only in the terminal `Error` snapshot.
    pub error: Option<String>,
}

impl Snapshot {
    /// A non-terminal progress record.
    pub fn running(current: u64, total: u64, stage: Stage) -> Self {
        Self {
            current,
            total,
            stage,
            result: None,
            error: None,
        }
    }

    /// The terminal success record.
    pub fn complete(result: JobResult) -> Self {
        Self {
            current: 100,
            total: 100,
            stage: Stage::Complete,
            result: Some(result),
            error: None,
        }
    }

    /// The terminal failure record.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            current: 0,
            total: 100,
            stage: Stage::Error,
            result: None,
            error: Some(error.into()),
        }
    }
}

/// Observer for per-step progress reports emitted by the pipeline stages.
pub trait ProgressObserver: Sync {
    /// Record one progress step. `current`/`total` are stage-local.
    fn report(&self, current: u64, total: u64, stage: Stage);
}

/// Observer that discards all reports.
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn report(&self, _current: u64, _total: u64, _stage: Stage) {}
}

/// Session-keyed concurrent store of progress snapshots.
///
/// The only state shared across job threads. All mutation is whole-record
/// replacement of an `Arc`'d snapshot under a write lock; `get` clones the
/// `Arc` out under a read lock, so readers never block each other and never
/// observe field-level tearing.
#[derive(Default)]
pub struct ProgressBoard {
    inner: RwLock<HashMap<String, Arc<Snapshot>>>,
}

impl ProgressBoard {
    /// Create an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically replace the snapshot for `session`.
    pub fn put(&self, session: &str, snapshot: Snapshot) {
        let mut map = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        map.insert(session.to_owned(), Arc::new(snapshot));
    }

    /// Read the latest snapshot for `session`, if the session exists.
    pub fn get(&self, session: &str) -> Option<Arc<Snapshot>> {
        let map = match self.inner.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        map.get(session).cloned()
    }
}
