//! Benchmarks for the head series index
//!
//! Run with: cargo bench

use criterion::{criterion_group, criterion_main, Criterion};
use headwater::head::{Head, HeadError, HeadOptions, HeadResult, SeriesLifecycle, SeriesRef};
use headwater::labels::{Labels, METRIC_NAME_LABEL};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tempfile::tempdir;

/// Label set shape used across all create benchmarks: one metric name
/// plus five labels of varying cardinality
fn series_labels(i: u64) -> Labels {
    Labels::from_pairs([
        (METRIC_NAME_LABEL.to_string(), "test".to_string()),
        ("a".to_string(), i.to_string()),
        ("b".to_string(), (i % 10).to_string()),
        ("c".to_string(), (i % 100).to_string()),
        ("d".to_string(), (i / 2).to_string()),
        ("e".to_string(), (i / 4).to_string()),
    ])
}

fn bench_head(data_dir: &std::path::Path, lifecycle: Option<Arc<dyn SeriesLifecycle>>) -> Head {
    let mut options = HeadOptions::new(data_dir);
    options.chunk_range = 1000;
    if let Some(lifecycle) = lifecycle {
        options.lifecycle = lifecycle;
    }
    Head::new(options).unwrap()
}

/// Hook that vetoes every creation, so each call takes the slow
/// no-insert path
struct FailingLifecycle;

impl SeriesLifecycle for FailingLifecycle {
    fn pre_creation(&self, _labels: &Labels) -> HeadResult<()> {
        Err(HeadError::AdmissionDenied("failed".to_string()))
    }

    fn post_creation(&self, _labels: &Labels) {}

    fn post_deletion(&self, _removed: &HashMap<SeriesRef, Labels>) {}
}

fn bench_series_create(c: &mut Criterion) {
    let mut group = c.benchmark_group("head");

    group.bench_function("get_or_create", |b| {
        let dir = tempdir().unwrap();
        let head = bench_head(dir.path(), None);

        let mut i = 0u64;
        b.iter(|| {
            i += 1;
            let labels = series_labels(i);
            head.get_or_create(labels.hash(), labels).unwrap()
        });
    });

    group.bench_function("get_or_create_parallel", |b| {
        // References are driven by an atomic counter outside the index,
        // each iteration creating a distinct series from whichever
        // thread claims it first.
        let threads = thread::available_parallelism().map(|n| n.get()).unwrap_or(4);

        b.iter_custom(|iters| {
            let dir = tempdir().unwrap();
            let head = bench_head(dir.path(), None);
            let next = AtomicU64::new(0);

            let start = Instant::now();
            thread::scope(|s| {
                for _ in 0..threads {
                    s.spawn(|| loop {
                        let i = next.fetch_add(1, Ordering::Relaxed);
                        if i >= iters {
                            break;
                        }
                        let labels = series_labels(i);
                        head.get_or_create(labels.hash(), labels).unwrap();
                    });
                }
            });
            start.elapsed()
        });
    });

    group.bench_function("get_or_create_pre_creation_failure", |b| {
        let dir = tempdir().unwrap();
        let head = bench_head(dir.path(), Some(Arc::new(FailingLifecycle)));

        let mut i = 0u64;
        b.iter(|| {
            i += 1;
            let labels = series_labels(i);
            // Every call is rejected; the index stays empty and the
            // admission check runs again each time.
            head.get_or_create(labels.hash(), labels).unwrap_err()
        });
    });

    group.finish();
}

fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("head_lookup");

    group.bench_function("get_by_ref", |b| {
        let dir = tempdir().unwrap();
        let head = bench_head(dir.path(), None);

        let refs: Vec<SeriesRef> = (0..10_000u64)
            .map(|i| {
                let labels = series_labels(i);
                head.get_or_create(labels.hash(), labels).unwrap().reference()
            })
            .collect();

        let mut i = 0usize;
        b.iter(|| {
            i = (i + 1) % refs.len();
            head.get_by_ref(refs[i]).unwrap()
        });
    });

    group.finish();
}

criterion_group!(benches, bench_series_create, bench_lookup);
criterion_main!(benches);
