use crate::worker::WorkerSet;
use crossbeam::channel::{bounded, select, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Outcome of a cancellation-guarded receive
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Next<T> {
    Item(T),
    Closed,
    Cancelled,
}

#[derive(Debug)]
struct Inner {
    cancelled: AtomicBool,
    /// Never sends; dropping it disconnects `done` for every observer.
    trigger: Mutex<Option<Sender<()>>>,
    done: Receiver<()>,
    workers: WorkerSet,
}

/// A shared, one-way "stop now" signal observed by every stage.
///
/// Clones share state. The token is created by the caller and passed by
/// reference to each stage; stages only observe it.
#[derive(Debug, Clone)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (trigger, done) = bounded(0);
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                trigger: Mutex::new(Some(trigger)),
                done,
                workers: WorkerSet::new(),
            }),
        }
    }

    /// Signal cancellation. Calling this more than once has no further effect.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        if let Some(trigger) = self.inner.trigger.lock().take() {
            drop(trigger);
            tracing::debug!("cancellation signalled");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Block until the token is cancelled
    pub fn wait(&self) {
        let _ = self.inner.done.recv();
    }

    /// Block up to `timeout`; returns whether the token was cancelled
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        match self.inner.done.recv_timeout(timeout) {
            Err(RecvTimeoutError::Disconnected) => true,
            Err(RecvTimeoutError::Timeout) | Ok(()) => self.is_cancelled(),
        }
    }

    /// Workers of every stage spawned against this token
    pub fn workers(&self) -> &WorkerSet {
        &self.inner.workers
    }

    /// Selectable side of the signal; ready (disconnected) once cancelled
    pub(crate) fn done(&self) -> &Receiver<()> {
        &self.inner.done
    }

    /// Receive from `rx`, giving up as soon as the token is cancelled.
    ///
    /// An already-cancelled token wins over a ready value.
    pub(crate) fn recv<T>(&self, rx: &Receiver<T>) -> Next<T> {
        if self.is_cancelled() {
            return Next::Cancelled;
        }
        select! {
            recv(rx) -> msg => match msg {
                Ok(value) => Next::Item(value),
                Err(_) => Next::Closed,
            },
            recv(self.done()) -> _ => Next::Cancelled,
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}
