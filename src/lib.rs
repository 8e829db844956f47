//! Lazy, cancellation-aware streaming stages connected by bounded channels.
//!
//! A pipeline is built from free functions: a source produces a [`Stream`],
//! transforms turn one stream into another, and [`consume`] drains the last
//! one on the calling thread. Every source and transform runs on its own
//! worker thread and owns its output queue, closing it on every exit path.
//!
//! # Features
//!
//! - Bounded crossbeam channels between stages (rendezvous by default)
//! - Strict ordering: each stage emits a subsequence of its input
//! - Per-stage error policy: ignore the failed value or stop the stage
//! - Cooperative cancellation through a shared [`CancelToken`]
//! - Worker tracking, so tests can assert that a pipeline has wound down
//! - Per-stage counters via [`StageStats`]
//!
//! # Example
//!
//! ```
//! use lazy_stream::{consume, filter, from_iter, map, with_output_capacity, CancelToken};
//!
//! let cancel = CancelToken::new();
//! let nums = from_iter(&cancel, 1..=10, &[with_output_capacity(4)]);
//! let small = filter(&cancel, nums, |v: &i32| Ok::<_, ()>(*v <= 5), &[]);
//! let doubled = map(&cancel, small, |v| Ok::<_, ()>(v * 2), &[]);
//!
//! let mut out = Vec::new();
//! consume(doubled, |v| {
//!     out.push(v);
//!     Ok::<_, ()>(())
//! })
//! .unwrap();
//! assert_eq!(out, vec![2, 4, 6, 8, 10]);
//! ```

pub mod cancel;
pub mod config;
pub mod error;
pub mod metrics;
pub mod sink;
pub mod source;
pub mod stage;
pub mod stream;
pub mod worker;

// Re-exports for convenience
pub use cancel::CancelToken;
pub use config::{
    ignore_errors, stop_on_error, with_error_policy, with_name, with_output_capacity, Decision,
    ErrorPolicy, StageConfig, StageOption,
};
pub use error::{PipelineError, Result};
pub use metrics::{StageExit, StageStats};
pub use sink::consume;
pub use source::{from_channel, from_iter};
pub use stage::{filter, map};
pub use stream::Stream;
pub use worker::WorkerSet;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
