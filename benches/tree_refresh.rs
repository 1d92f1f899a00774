//! Comment tree refresh benchmarks
//!
//! Measures the full prune+reconcile pass over synthetic snapshots: a cold
//! build of the forest, the idempotent no-change refresh, and a refresh
//! after store churn.
//!
//! Run with: `cargo bench --bench tree_refresh`

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};

use hexnote::annotations::{Comment, CommentStore, CommentTree, RangeKey};

/// Build a store with `blocks` 16-byte regions, each holding a nested
/// 4-byte field comment, all under one whole-image comment
fn build_store(blocks: usize) -> CommentStore {
    let mut store = CommentStore::new();
    store.set(
        RangeKey::new(0, (blocks * 16) as u64),
        Comment::new("whole image"),
    );
    for i in 0..blocks {
        let offset = (i * 16) as u64;
        store.set(RangeKey::new(offset, 16), Comment::new(format!("block {}", i)));
        store.set(RangeKey::new(offset + 4, 4), Comment::new("field"));
    }
    store
}

fn bench_cold_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("refresh_cold");
    for blocks in [100, 1_000] {
        let store = build_store(blocks);
        group.bench_with_input(BenchmarkId::from_parameter(blocks), &store, |b, store| {
            b.iter_batched(
                CommentTree::new,
                |mut tree| {
                    tree.refresh(black_box(store));
                    tree
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_idempotent_refresh(c: &mut Criterion) {
    let mut group = c.benchmark_group("refresh_unchanged");
    for blocks in [100, 1_000] {
        let store = build_store(blocks);
        let mut tree = CommentTree::new();
        tree.refresh(&store);
        group.bench_with_input(BenchmarkId::from_parameter(blocks), &store, |b, store| {
            b.iter(|| tree.refresh(black_box(store)));
        });
    }
    group.finish();
}

fn bench_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("refresh_churn");
    for blocks in [100, 1_000] {
        group.bench_with_input(
            BenchmarkId::from_parameter(blocks),
            &blocks,
            |b, &blocks| {
                b.iter_batched(
                    || {
                        let store = build_store(blocks);
                        let mut tree = CommentTree::new();
                        tree.refresh(&store);
                        (store, tree)
                    },
                    |(mut store, mut tree)| {
                        // Drop one mid-file block and grow the tail
                        let victim = (blocks / 2 * 16) as u64;
                        store.remove(&RangeKey::new(victim, 16));
                        store.set(
                            RangeKey::new((blocks * 16) as u64, 16),
                            Comment::new("appended block"),
                        );
                        tree.refresh(&store);
                        (store, tree)
                    },
                    BatchSize::SmallInput,
                );
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_cold_build, bench_idempotent_refresh, bench_churn);
criterion_main!(benches);
