use crate::cancel::{CancelToken, Next};
use crate::config::{Decision, StageConfig, StageOption};
use crate::metrics::StageExit;
use crate::stream::{channel, Emitter, Stream};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Start one stage worker that owns the producer side of a new stream.
///
/// `body` runs on the worker and reports how it finished. Whatever happens
/// inside it, a panic included, the exit is recorded and the output queue
/// is closed before the worker ends.
pub(crate) fn spawn_stage<T, B>(
    cancel: &CancelToken,
    capacity: usize,
    name: String,
    body: B,
) -> Stream<T>
where
    T: Send + 'static,
    B: FnOnce(&Emitter<T>) -> StageExit + Send + 'static,
{
    let (emitter, stream) = channel(capacity, cancel, &name);

    cancel.workers().spawn(move || {
        tracing::debug!(stage = %name, capacity, "stage worker started");

        let exit = match panic::catch_unwind(AssertUnwindSafe(|| body(&emitter))) {
            Ok(exit) => exit,
            Err(payload) => {
                tracing::warn!(
                    stage = %name,
                    panic = panic_message(payload.as_ref()),
                    "user function panicked, closing stage output"
                );
                StageExit::Panicked
            }
        };

        emitter.stats().record_exit(exit);
        tracing::debug!(
            stage = %name,
            %exit,
            emitted = emitter.stats().emitted(),
            "stage worker exited"
        );
        // Dropping the emitter closes the output.
        drop(emitter);
    });

    stream
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

/// Shared loop of every transform stage.
///
/// `step` returns the value to emit, `None` to drop it silently, or the
/// user error for the policy to judge. The upstream stream is dropped when
/// this returns, which disconnects its producer.
fn drive<IN, OUT, E, S>(
    upstream: Stream<IN>,
    out: &Emitter<OUT>,
    config: &StageConfig<E>,
    mut step: S,
) -> StageExit
where
    E: 'static,
    S: FnMut(IN) -> Result<Option<OUT>, E>,
{
    loop {
        let value = match upstream.next_or_cancel(out.token()) {
            Next::Item(value) => value,
            Next::Closed => return StageExit::Exhausted,
            Next::Cancelled => return StageExit::Cancelled,
        };

        match step(value) {
            Ok(Some(candidate)) => {
                if let Err(err) = out.emit(candidate) {
                    return err.into();
                }
            }
            Ok(None) => out.stats().record_filtered(),
            Err(err) => match config.decide(&err) {
                Decision::Stop => {
                    tracing::warn!(stage = out.stats().name(), "error policy stopped the stage");
                    return StageExit::Stopped;
                }
                Decision::Ignore => {
                    out.stats().record_ignored_error();
                    tracing::trace!(stage = out.stats().name(), "ignored user error");
                }
            },
        }
    }
}

/// Apply `mapper` to every upstream value, in order.
///
/// Failed values are handed to the error policy (default: ignore). On
/// `Decision::Stop` the stage ends without reading further input.
pub fn map<IN, OUT, E, F>(
    cancel: &CancelToken,
    upstream: Stream<IN>,
    mut mapper: F,
    options: &[StageOption<E>],
) -> Stream<OUT>
where
    IN: Send + 'static,
    OUT: Send + 'static,
    E: 'static,
    F: FnMut(IN) -> Result<OUT, E> + Send + 'static,
{
    let config = StageConfig::resolve(options);
    let name = config.label("map");
    spawn_stage(cancel, config.output_capacity, name, move |out| {
        drive(upstream, out, &config, |value| mapper(value).map(Some))
    })
}

/// Forward the upstream values for which `predicate` returns `Ok(true)`.
///
/// `Ok(false)` drops the value silently; an error goes to the error policy.
pub fn filter<T, E, P>(
    cancel: &CancelToken,
    upstream: Stream<T>,
    mut predicate: P,
    options: &[StageOption<E>],
) -> Stream<T>
where
    T: Send + 'static,
    E: 'static,
    P: FnMut(&T) -> Result<bool, E> + Send + 'static,
{
    let config = StageConfig::resolve(options);
    let name = config.label("filter");
    spawn_stage(cancel, config.output_capacity, name, move |out| {
        drive(upstream, out, &config, |value| {
            predicate(&value).map(|keep| keep.then_some(value))
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{stop_on_error, with_error_policy, with_name, with_output_capacity};
    use crate::source::from_iter;
    use std::time::Duration;

    fn idle(cancel: &CancelToken) {
        cancel
            .workers()
            .wait_idle(Duration::from_secs(2))
            .expect("stage workers should exit");
    }

    #[test]
    fn test_map_doubles() {
        let cancel = CancelToken::new();
        let nums = from_iter(&cancel, vec![1, 2, 3], &[]);
        let doubled = map(&cancel, nums, |v: i32| Ok::<_, ()>(v * 2), &[]);
        let stats = doubled.stats().clone();

        assert_eq!(doubled.collect::<Vec<_>>(), vec![2, 4, 6]);
        assert_eq!(stats.emitted(), 3);
        assert_eq!(stats.exit(), Some(StageExit::Exhausted));
        idle(&cancel);
    }

    #[test]
    fn test_map_changes_type() {
        let cancel = CancelToken::new();
        let nums = from_iter(&cancel, vec![1u8, 2, 3], &[]);
        let labels = map(&cancel, nums, |v| Ok::<_, ()>(format!("#{}", v)), &[]);
        assert_eq!(labels.collect::<Vec<_>>(), vec!["#1", "#2", "#3"]);
        idle(&cancel);
    }

    #[test]
    fn test_map_counts_ignored_errors() {
        let cancel = CancelToken::new();
        let nums = from_iter(&cancel, 1..=6, &[]);
        let odd_only = map(
            &cancel,
            nums,
            |v: u32| if v % 2 == 0 { Err("even") } else { Ok(v) },
            &[],
        );
        let stats = odd_only.stats().clone();

        assert_eq!(odd_only.collect::<Vec<_>>(), vec![1, 3, 5]);
        assert_eq!(stats.ignored_errors(), 3);
        assert_eq!(stats.emitted(), 3);
        idle(&cancel);
    }

    #[test]
    fn test_policy_receives_the_exact_error() {
        let cancel = CancelToken::new();
        let nums = from_iter(&cancel, vec![1, 2, 3], &[]);
        let out = map(
            &cancel,
            nums,
            |v: i32| if v == 2 { Err(format!("bad value {}", v)) } else { Ok(v) },
            &[with_error_policy(|err: &String| {
                assert_eq!(err, "bad value 2");
                Decision::Stop
            })],
        );
        let stats = out.stats().clone();

        assert_eq!(out.collect::<Vec<_>>(), vec![1]);
        assert_eq!(stats.exit(), Some(StageExit::Stopped));
        idle(&cancel);
    }

    #[test]
    fn test_filter_counts_rejections() {
        let cancel = CancelToken::new();
        let nums = from_iter(&cancel, 1..=10, &[]);
        let evens = filter(&cancel, nums, |v: &u32| Ok::<_, ()>(v % 2 == 0), &[]);
        let stats = evens.stats().clone();

        assert_eq!(evens.collect::<Vec<_>>(), vec![2, 4, 6, 8, 10]);
        assert_eq!(stats.filtered(), 5);
        assert_eq!(stats.ignored_errors(), 0);
        idle(&cancel);
    }

    #[test]
    fn test_filter_stop_on_error() {
        let cancel = CancelToken::new();
        let nums = from_iter(&cancel, 1..=5, &[]);
        let out = filter(
            &cancel,
            nums,
            |v: &i32| if *v == 3 { Err("boom") } else { Ok(true) },
            &[StageOption::ErrorPolicy(stop_on_error())],
        );
        assert_eq!(out.collect::<Vec<_>>(), vec![1, 2]);
        idle(&cancel);
    }

    #[test]
    fn test_output_capacity_and_name() {
        let cancel = CancelToken::new();
        let nums = from_iter(&cancel, vec![1], &[with_output_capacity(1)]);
        let out = map(
            &cancel,
            nums,
            |v: i32| Ok::<_, ()>(v),
            &[with_output_capacity(4), with_name("identity")],
        );
        assert_eq!(out.capacity(), 4);
        assert_eq!(out.stats().name(), "identity");

        let out = filter(&cancel, out, |_: &i32| Ok::<_, ()>(true), &[with_output_capacity(5)]);
        assert_eq!(out.capacity(), 5);
        assert_eq!(out.stats().name(), "filter");

        assert_eq!(out.collect::<Vec<_>>(), vec![1]);
        idle(&cancel);
    }

    #[test]
    fn test_panicking_mapper_closes_output() {
        let cancel = CancelToken::new();
        let nums = from_iter(&cancel, 1..=5, &[]);
        let out = map(
            &cancel,
            nums,
            |v: i32| {
                if v == 3 {
                    panic!("mapper fault");
                }
                Ok::<_, ()>(v)
            },
            &[],
        );
        let stats = out.stats().clone();

        assert_eq!(out.collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(stats.exit(), Some(StageExit::Panicked));
        idle(&cancel);
    }

    #[test]
    fn test_panic_message_payloads() {
        let payload: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(payload.as_ref()), "static");
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");
        let payload: Box<dyn Any + Send> = Box::new(42);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }
}
