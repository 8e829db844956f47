//! Cancelling a pipeline mid-stream
//!
//! A large source is mapped and consumed on a separate thread. The consumer
//! cancels the shared token after a handful of values; every stage notices
//! and closes its output, so the consumer sees end-of-stream and the
//! pipeline winds down well before the input is exhausted.
//!
//! Usage: cargo run --example cancellation

use crossbeam::channel::bounded;
use lazy_stream::{consume, from_iter, map, CancelToken};
use std::thread;
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cancel = CancelToken::new();
    let big: Vec<u32> = (1..=1000).collect();

    let nums = from_iter(&cancel, big, &[]);
    let id = map(&cancel, nums, |v: u32| Ok::<_, ()>(v), &[]);

    let canceller = cancel.clone();
    let (done_tx, done_rx) = bounded(1);
    thread::spawn(move || {
        let mut consumed = 0;
        let _ = consume(id, |_| {
            consumed += 1;
            if consumed == 5 {
                canceller.cancel();
            }
            Ok::<_, ()>(())
        });
        let _ = done_tx.send(consumed);
    });

    match done_rx.recv_timeout(Duration::from_secs(2)) {
        Ok(consumed) => println!("consumed before cancel: {}", consumed),
        Err(_) => println!("timeout waiting for cancellation"),
    }

    cancel.workers().wait_idle(Duration::from_secs(1))?;
    println!("all stage workers exited");
    Ok(())
}
