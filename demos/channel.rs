//! Feeding a pipeline from a caller-owned queue
//!
//! A producer thread writes raw text into a crossbeam channel the caller
//! created. `from_channel` turns the receiving end into a stream; a map
//! parses each value, recording parse failures through its error policy
//! instead of stopping, and the rest of the pipeline keeps the odd numbers
//! and scales them by ten. The stream ends when the producer drops its
//! sender.
//!
//! Usage: cargo run --example channel

use crossbeam::channel::bounded;
use lazy_stream::{consume, filter, from_channel, map, with_error_policy, CancelToken, Decision};
use parking_lot::Mutex;
use std::num::ParseIntError;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cancel = CancelToken::new();
    let (tx, rx) = bounded::<String>(2);

    let producer = thread::spawn(move || {
        for raw in ["1", "2", "three", "4", "5", "six"] {
            if tx.send(raw.to_string()).is_err() {
                break;
            }
        }
    });

    let rejected = Arc::new(Mutex::new(Vec::new()));
    let record = Arc::clone(&rejected);

    let lines = from_channel(&cancel, rx, &[]);
    let parsed = map(
        &cancel,
        lines,
        |raw: String| raw.parse::<u64>(),
        &[with_error_policy(move |err: &ParseIntError| {
            record.lock().push(err.to_string());
            Decision::Ignore
        })],
    );
    let parse_stats = parsed.stats().clone();
    let odd = filter(&cancel, parsed, |v: &u64| Ok::<_, ()>(v % 2 == 1), &[]);
    let scaled = map(&cancel, odd, |v: u64| Ok::<_, ()>(v * 10), &[]);

    let mut total = 0;
    consume(scaled, |v| {
        println!("value: {}", v);
        total += v;
        Ok::<_, ()>(())
    })
    .map_err(|_| "consumer failed")?;

    producer.join().map_err(|_| "producer panicked")?;
    cancel.workers().wait_idle(Duration::from_secs(1))?;

    println!("total: {}", total);
    println!("{}", parse_stats.format());
    for err in rejected.lock().iter() {
        println!("rejected: {}", err);
    }
    Ok(())
}
