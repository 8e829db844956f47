use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lazy_stream::{consume, filter, from_iter, map, with_output_capacity, CancelToken};
use std::time::Duration;

fn benchmark_single_stage_throughput(c: &mut Criterion) {
    c.bench_function("single_stage_1000_msgs", |b| {
        b.iter(|| {
            let cancel = CancelToken::new();
            let data: Vec<Vec<u8>> = (0..1000).map(|i| vec![i as u8; 64]).collect();
            let source = from_iter(&cancel, data, &[with_output_capacity(1000)]);

            let mut bytes = 0usize;
            let _ = consume(source, |msg| {
                bytes += black_box(msg).len();
                Ok::<_, ()>(())
            });
            black_box(bytes);
        });
    });
}

fn benchmark_three_stage_throughput(c: &mut Criterion) {
    c.bench_function("three_stage_1000_msgs", |b| {
        b.iter(|| {
            let cancel = CancelToken::new();
            let data: Vec<Vec<u8>> = (0..1000).map(|i| vec![i as u8; 64]).collect();
            let source = from_iter(&cancel, data, &[with_output_capacity(1000)]);
            let stamped = map(
                &cancel,
                source,
                |mut msg: Vec<u8>| {
                    msg[0] = msg[0].wrapping_add(1);
                    Ok::<_, ()>(msg)
                },
                &[with_output_capacity(1000)],
            );
            let kept = filter(
                &cancel,
                stamped,
                |msg: &Vec<u8>| Ok::<_, ()>(msg[0] % 2 == 0),
                &[with_output_capacity(1000)],
            );

            let _ = consume(kept, |msg| {
                black_box(msg);
                Ok::<_, ()>(())
            });
        });
    });
}

fn benchmark_rendezvous_throughput(c: &mut Criterion) {
    c.bench_function("rendezvous_5000_msgs", |b| {
        b.iter(|| {
            let cancel = CancelToken::new();
            let source = from_iter(&cancel, 0..5000u32, &[]);
            let doubled = map(&cancel, source, |v: u32| Ok::<_, ()>(v * 2), &[]);

            let mut sum = 0u64;
            let _ = consume(doubled, |v| {
                sum += u64::from(v);
                Ok::<_, ()>(())
            });
            black_box(sum);
        });
    });
}

criterion_group!(
    name = benches;
    config = Criterion::default().measurement_time(Duration::from_secs(10));
    targets = benchmark_single_stage_throughput, benchmark_three_stage_throughput, benchmark_rendezvous_throughput
);
criterion_main!(benches);
