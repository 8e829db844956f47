use crate::cancel::{CancelToken, Next};
use crate::config::{StageConfig, StageOption};
use crate::metrics::StageExit;
use crate::stage::spawn_stage;
use crate::stream::Stream;
use crossbeam::channel::Receiver;
use std::convert::Infallible;

/// Emit every item of `items` in order, then close.
///
/// Stops early when `cancel` fires or the returned stream is dropped.
/// Sources cannot fail, so only the capacity and name options apply.
pub fn from_iter<I>(
    cancel: &CancelToken,
    items: I,
    options: &[StageOption<Infallible>],
) -> Stream<I::Item>
where
    I: IntoIterator,
    I::IntoIter: Send + 'static,
    I::Item: Send + 'static,
{
    let config = StageConfig::resolve(options);
    let items = items.into_iter();
    spawn_stage(cancel, config.output_capacity, config.label("source"), move |out| {
        for item in items {
            if let Err(err) = out.emit(item) {
                return err.into();
            }
        }
        StageExit::Exhausted
    })
}

/// Forward every value received on a caller-owned queue.
///
/// The stream closes once `input` is disconnected (all of the caller's
/// senders dropped and the queue drained) or `cancel` fires. The stage
/// never closes the caller's queue; it only drops its own receiver handle.
pub fn from_channel<T>(
    cancel: &CancelToken,
    input: Receiver<T>,
    options: &[StageOption<Infallible>],
) -> Stream<T>
where
    T: Send + 'static,
{
    let config = StageConfig::resolve(options);
    spawn_stage(cancel, config.output_capacity, config.label("channel"), move |out| {
        loop {
            match out.token().recv(&input) {
                Next::Item(value) => {
                    if let Err(err) = out.emit(value) {
                        return err.into();
                    }
                }
                Next::Closed => return StageExit::Exhausted,
                Next::Cancelled => return StageExit::Cancelled,
            }
        }
    })
}
