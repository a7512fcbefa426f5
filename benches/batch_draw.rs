//! Benchmarks for gesture batch scheduling
//!
//! Covers drawing batches across whole shuffle cycles and producing the
//! persisted queue state for pools of realistic size.

use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use gesture_recorder::scheduler::{GestureBatchScheduler, MemoryQueueStore};
use gesture_recorder::test_utils::sample_pool;
use std::hint::black_box;

const POOL_SIZES: [usize; 3] = [20, 120, 1000];

fn scheduler_with_pool(size: usize) -> GestureBatchScheduler<MemoryQueueStore> {
    let mut scheduler = GestureBatchScheduler::with_seed(MemoryQueueStore::new(), 42);
    scheduler.fill_pool(sample_pool(size));
    scheduler
}

fn bench_full_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("draw_full_cycle");

    for size in POOL_SIZES {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter_batched(
                || scheduler_with_pool(size),
                |mut scheduler| {
                    for _ in 0..size / 5 {
                        black_box(scheduler.draw_batch(5).map(|batch| batch.len()).ok());
                    }
                    scheduler
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_snapshot(c: &mut Criterion) {
    let mut scheduler = scheduler_with_pool(1000);
    scheduler.draw_batch(5).expect("pool larger than batch");

    c.bench_function("queue_state_to_yaml", |b| {
        b.iter(|| black_box(scheduler.snapshot().to_yaml().map(|yaml| yaml.len()).ok()))
    });
}

criterion_group!(benches, bench_full_cycle, bench_snapshot);
criterion_main!(benches);
