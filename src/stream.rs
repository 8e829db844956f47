use crate::cancel::{CancelToken, Next};
use crate::error::EmitError;
use crate::metrics::StageStats;
use crossbeam::channel::{bounded, select, Receiver, Sender};
use std::fmt;

/// The output of a stage: an ordered, closable conduit of values.
///
/// A `Stream` only lets its holder read. Iterating blocks until the next
/// value arrives and ends once the producing stage has closed the queue and
/// every buffered value has been taken. Dropping a `Stream` before the end
/// disconnects the producer, which then stops at its next enqueue.
pub struct Stream<T> {
    rx: Receiver<T>,
    capacity: usize,
    stats: StageStats,
}

impl<T> Stream<T> {
    /// Capacity the output queue was created with
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Counters of the stage that produces this stream
    pub fn stats(&self) -> &StageStats {
        &self.stats
    }

    /// Take the next value unless `cancel` fires first
    pub(crate) fn next_or_cancel(&self, cancel: &CancelToken) -> Next<T> {
        cancel.recv(&self.rx)
    }
}

impl<T> Iterator for Stream<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.rx.recv().ok()
    }
}

impl<T> fmt::Debug for Stream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream")
            .field("stage", &self.stats.name())
            .field("capacity", &self.capacity)
            .field("buffered", &self.rx.len())
            .finish()
    }
}

/// Producer side of a [`Stream`], owned by exactly one stage worker.
///
/// The queue closes when the emitter is dropped, which happens on every
/// exit path of the worker that owns it.
pub(crate) struct Emitter<T> {
    tx: Sender<T>,
    cancel: CancelToken,
    stats: StageStats,
}

impl<T> Emitter<T> {
    /// Enqueue `value`, racing the send against cancellation.
    ///
    /// A token that is already cancelled always wins, even if the queue has
    /// room. On failure the value is dropped.
    pub(crate) fn emit(&self, value: T) -> Result<(), EmitError> {
        if self.cancel.is_cancelled() {
            return Err(EmitError::Cancelled);
        }
        select! {
            send(self.tx, value) -> res => match res {
                Ok(()) => {
                    self.stats.record_emitted();
                    Ok(())
                }
                Err(_) => Err(EmitError::Disconnected),
            },
            recv(self.cancel.done()) -> _ => Err(EmitError::Cancelled),
        }
    }

    pub(crate) fn stats(&self) -> &StageStats {
        &self.stats
    }

    pub(crate) fn token(&self) -> &CancelToken {
        &self.cancel
    }
}

/// Create a stage output queue of the given capacity
pub(crate) fn channel<T>(
    capacity: usize,
    cancel: &CancelToken,
    name: &str,
) -> (Emitter<T>, Stream<T>) {
    let (tx, rx) = bounded(capacity);
    let stats = StageStats::new(name);
    let emitter = Emitter {
        tx,
        cancel: cancel.clone(),
        stats: stats.clone(),
    };
    let stream = Stream {
        rx,
        capacity,
        stats,
    };
    (emitter, stream)
}
