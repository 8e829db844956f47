//! Number processing pipeline demonstrating filtering and transformations
//!
//! Pipeline:
//! 1. Generate: numbers 1-100 as text, with a few malformed entries mixed in
//! 2. Parse: text to number; malformed entries are ignored by the error policy
//! 3. Filter: keep only even numbers
//! 4. Transform: multiply by 10
//! 5. Aggregate: sum all numbers on the calling thread
//!
//! Usage: cargo run --example filter_pipeline --release

use lazy_stream::{
    consume, filter, from_iter, map, with_name, with_output_capacity, CancelToken,
};
use std::num::ParseIntError;
use std::time::Instant;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Number Processing Pipeline");
    println!("==========================");
    println!("Generating numbers 1-100, filtering evens, multiplying by 10, and summing");
    println!();

    let start = Instant::now();
    let cancel = CancelToken::new();

    let mut lines: Vec<String> = (1..=100).map(|n: u32| n.to_string()).collect();
    lines.insert(10, "eleven".to_string());
    lines.insert(50, String::new());

    let text = from_iter(&cancel, lines, &[with_output_capacity(50), with_name("generator")]);
    let numbers = map(
        &cancel,
        text,
        |line: String| line.parse::<u64>(),
        &[with_output_capacity(50), with_name("parse")],
    );
    let parse_stats = numbers.stats().clone();
    let evens = filter(
        &cancel,
        numbers,
        |n: &u64| Ok::<_, ParseIntError>(n % 2 == 0),
        &[with_name("even_filter")],
    );
    let scaled = map(
        &cancel,
        evens,
        |n: u64| Ok::<_, ParseIntError>(n * 10),
        &[with_name("multiply_by_10")],
    );

    let mut sum = 0u64;
    let mut count = 0u64;
    consume(scaled, |n| {
        sum += n;
        count += 1;
        if count % 5 == 0 {
            println!("Running sum: {} (count: {})", sum, count);
        }
        Ok::<_, std::io::Error>(())
    })?;

    println!("\n=== Final Results ===");
    println!("Total numbers processed: {}", count);
    println!("Sum of all numbers: {}", sum);
    if count > 0 {
        println!("Average: {:.2}", sum as f64 / count as f64);
    }
    println!("Malformed lines skipped: {}", parse_stats.ignored_errors());

    cancel.workers().wait_idle(std::time::Duration::from_secs(1))?;
    let elapsed = start.elapsed();
    println!("\nPipeline execution time: {:.3}s", elapsed.as_secs_f64());

    Ok(())
}
