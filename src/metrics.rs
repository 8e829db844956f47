use crate::error::EmitError;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// How a stage worker finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageExit {
    /// Upstream closed and every value was handled
    Exhausted,
    /// The error policy returned `Decision::Stop`
    Stopped,
    /// The cancellation token fired
    Cancelled,
    /// The downstream handle was dropped before the stage finished
    Disconnected,
    /// A user function panicked; handled like a stop
    Panicked,
}

impl fmt::Display for StageExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StageExit::Exhausted => "exhausted",
            StageExit::Stopped => "stopped",
            StageExit::Cancelled => "cancelled",
            StageExit::Disconnected => "disconnected",
            StageExit::Panicked => "panicked",
        };
        f.write_str(s)
    }
}

impl From<EmitError> for StageExit {
    fn from(err: EmitError) -> Self {
        match err {
            EmitError::Cancelled => StageExit::Cancelled,
            EmitError::Disconnected => StageExit::Disconnected,
        }
    }
}

/// Per-stage counters shared between a worker and its output handle
#[derive(Debug, Clone)]
pub struct StageStats {
    name: Arc<str>,
    /// Values delivered to the output queue
    emitted: Arc<AtomicU64>,
    /// User errors discarded under `Decision::Ignore`
    ignored_errors: Arc<AtomicU64>,
    /// Values a filter predicate rejected
    filtered: Arc<AtomicU64>,
    exit: Arc<Mutex<Option<StageExit>>>,
}

impl StageStats {
    pub(crate) fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            emitted: Arc::new(AtomicU64::new(0)),
            ignored_errors: Arc::new(AtomicU64::new(0)),
            filtered: Arc::new(AtomicU64::new(0)),
            exit: Arc::new(Mutex::new(None)),
        }
    }

    pub(crate) fn record_emitted(&self) {
        self.emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_ignored_error(&self) {
        self.ignored_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_filtered(&self) {
        self.filtered.fetch_add(1, Ordering::Relaxed);
    }

    /// Only the first exit is kept; a worker finishes once.
    pub(crate) fn record_exit(&self, exit: StageExit) {
        let mut slot = self.exit.lock();
        if slot.is_none() {
            *slot = Some(exit);
        }
    }

    /// Stage label used in log fields
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn emitted(&self) -> u64 {
        self.emitted.load(Ordering::Relaxed)
    }

    pub fn ignored_errors(&self) -> u64 {
        self.ignored_errors.load(Ordering::Relaxed)
    }

    pub fn filtered(&self) -> u64 {
        self.filtered.load(Ordering::Relaxed)
    }

    /// Terminal state, or `None` while the worker is still running.
    ///
    /// The exit is recorded before the output queue closes, so once a
    /// consumer has seen end-of-stream this is always `Some`.
    pub fn exit(&self) -> Option<StageExit> {
        *self.exit.lock()
    }

    /// Format the counters as a human-readable line
    pub fn format(&self) -> String {
        let exit = match self.exit() {
            Some(exit) => exit.to_string(),
            None => "running".to_string(),
        };
        format!(
            "{}: emitted {}, ignored errors {}, filtered {}, {}",
            self.name,
            self.emitted(),
            self.ignored_errors(),
            self.filtered(),
            exit
        )
    }
}
