use crate::error::{PipelineError, Result};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread::spawn;
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct WorkerState {
    active: Mutex<usize>,
    idle: Condvar,
}

/// Tracks the background workers spawned by a group of stages.
///
/// Workers are detached threads; the set only counts them. A worker is
/// counted from the moment it is spawned until its body has returned or
/// unwound, so `active() == 0` means every stage in the group has exited
/// and dropped its output sender.
#[derive(Debug, Clone, Default)]
pub struct WorkerSet {
    state: Arc<WorkerState>,
}

impl WorkerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of workers that have not yet finished
    pub fn active(&self) -> usize {
        *self.state.active.lock()
    }

    /// Block until every worker has exited or `timeout` elapses.
    ///
    /// A timeout too large to represent as a deadline (`Duration::MAX`)
    /// waits without one.
    pub fn wait_idle(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now().checked_add(timeout);
        let mut active = self.state.active.lock();
        while *active > 0 {
            match deadline {
                Some(deadline) => {
                    if self.state.idle.wait_until(&mut active, deadline).timed_out() {
                        break;
                    }
                }
                None => self.state.idle.wait(&mut active),
            }
        }
        match *active {
            0 => Ok(()),
            active => Err(PipelineError::QuiescenceTimeout { active }),
        }
    }

    pub(crate) fn spawn<F>(&self, body: F)
    where
        F: FnOnce() + Send + 'static,
    {
        // Count before the thread exists so callers never observe a gap.
        *self.state.active.lock() += 1;
        let guard = WorkerGuard {
            state: Arc::clone(&self.state),
        };
        spawn(move || {
            let _guard = guard;
            body();
        });
    }
}

/// Decrements the active count when the worker ends, unwinding included
struct WorkerGuard {
    state: Arc<WorkerState>,
}

impl Drop for WorkerGuard {
    fn drop(&mut self) {
        let mut active = self.state.active.lock();
        *active -= 1;
        if *active == 0 {
            self.state.idle.notify_all();
        }
    }
}
