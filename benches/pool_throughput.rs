//! Benchmarks for queue and pool throughput

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pripool::prelude::*;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn bench_heap_push_pop(c: &mut Criterion) {
    let mut group = c.benchmark_group("heap_push_pop");

    for size in [100usize, 1_000, 10_000] {
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);
        let values: Vec<i32> = (0..size).map(|_| rng.gen()).collect();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &values, |b, values| {
            b.iter(|| {
                let mut heap = Heap::new(|a: &i32, b: &i32| a > b);
                for &v in values {
                    heap.push(v).unwrap();
                }
                while let Some(v) = heap.pop() {
                    black_box(v);
                }
            });
        });
    }

    group.finish();
}

fn bench_submit_and_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("submit_and_drain");
    let tasks = 10_000;
    group.throughput(Throughput::Elements(tasks as u64));

    for threads in [1usize, 2, 4, 8] {
        group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |b, &threads| {
            b.iter(|| {
                let pool = ThreadPool::new(threads).unwrap();
                let counter = Arc::new(AtomicUsize::new(0));

                for i in 0..tasks {
                    let counter = counter.clone();
                    pool.submit(
                        move || {
                            counter.fetch_add(1, Ordering::Relaxed);
                        },
                        (i % 16) as i32,
                    )
                    .unwrap();
                }

                pool.shutdown(ShutdownMode::Graceful).unwrap();
                black_box(counter.load(Ordering::Relaxed))
            });
        });
    }

    group.finish();
}

fn bench_future_round_trip(c: &mut Criterion) {
    let pool = ThreadPool::new(num_threads()).unwrap();

    c.bench_function("future_round_trip", |b| {
        b.iter(|| {
            let future = pool.spawn(|| black_box(6 * 7)).unwrap();
            future.wait()
        });
    });

    c.bench_function("future_batch_1000", |b| {
        b.iter(|| {
            let futures: Vec<_> = (0..1_000)
                .map(|i| pool.submit_with_future(move || black_box(i * 2), i % 8).unwrap())
                .collect();
            futures.into_iter().filter_map(TaskFuture::wait).sum::<i32>()
        });
    });

    pool.shutdown(ShutdownMode::Graceful).unwrap();
}

fn num_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get().min(8))
        .unwrap_or(4)
}

criterion_group!(
    benches,
    bench_heap_push_pop,
    bench_submit_and_drain,
    bench_future_round_trip
);
criterion_main!(benches);
