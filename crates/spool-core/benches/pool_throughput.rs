//! Pool submission/drain throughput

use criterion::{criterion_group, criterion_main, Criterion};
use spool_core::pool::TaskPool;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn bench_submit_and_drain(c: &mut Criterion) {
    let pool = TaskPool::new(4);
    c.bench_function("submit_and_drain_1k_counter_tasks", |b| {
        b.iter(|| {
            let counter = Arc::new(AtomicUsize::new(0));
            for _ in 0..1000 {
                let counter = Arc::clone(&counter);
                pool.submit(move || {
                    counter.fetch_add(1, Ordering::Relaxed);
                });
            }
            pool.wait().unwrap();
            assert_eq!(counter.load(Ordering::Relaxed), 1000);
        })
    });
}

fn bench_fan_out_fan_in(c: &mut Criterion) {
    c.bench_function("pool_lifecycle_8_workers", |b| {
        b.iter(|| {
            let pool = TaskPool::new(8);
            pool.wait().unwrap();
            drop(pool);
        })
    });
}

criterion_group!(benches, bench_submit_and_drain, bench_fan_out_fan_in);
criterion_main!(benches);
