use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::collections::BTreeMap;

use btree_buckets::set_ops::{self, KeySource};
use btree_buckets::{Bucket, BucketState, LeafArena, OrderedLeaf, Set};

/// A full leaf of native keys.
const LEAF: usize = 120;
/// Number of leaves chained together for the walk and set-operation benchmarks.
const LEAVES: usize = 64;

// ─── Helper functions to generate key sequences ─────────────────────────────

fn random_keys(n: usize) -> Vec<i64> {
    // Use a simple LCG for deterministic pseudo-random sequence
    let mut keys = Vec::with_capacity(n);
    let mut x: u64 = 12345;
    for _ in 0..n {
        x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
        keys.push((x >> 33) as i64);
    }
    keys
}

fn full_bucket() -> Bucket<i64, i64> {
    let mut bucket = Bucket::new();
    bucket.update((0..LEAF as i64).map(|k| (k * 2, k))).unwrap();
    bucket
}

fn stepped_set(step: i64) -> Set<i64> {
    let mut set = Set::new();
    set.update((0..(LEAF * LEAVES) as i64).map(|k| k * step)).unwrap();
    set
}

// ─── Leaf Benchmarks ────────────────────────────────────────────────────────

fn bench_bucket_insert_random(c: &mut Criterion) {
    let keys = random_keys(LEAF);
    let mut group = c.benchmark_group("bucket_insert_random");

    group.bench_function(BenchmarkId::new("Bucket", LEAF), |b| {
        b.iter(|| {
            let mut bucket = Bucket::new();
            for &k in &keys {
                bucket.insert(k, k).unwrap();
            }
            bucket
        });
    });

    group.bench_function(BenchmarkId::new("BTreeMap", LEAF), |b| {
        b.iter(|| {
            let mut map = BTreeMap::new();
            for &k in &keys {
                map.insert(k, k);
            }
            map
        });
    });

    group.finish();
}

fn bench_bucket_search(c: &mut Criterion) {
    let bucket = full_bucket();
    let mut group = c.benchmark_group("bucket_search");

    group.bench_function(BenchmarkId::new("Bucket", LEAF), |b| {
        b.iter(|| (0..2 * LEAF as i64).filter(|k| bucket.contains(k)).count());
    });

    group.finish();
}

fn bench_split_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("split_chain");

    group.bench_function(BenchmarkId::new("LeafArena", LEAF * LEAVES), |b| {
        b.iter(|| {
            let mut arena = LeafArena::new();
            let mut bucket = Bucket::new();
            bucket.update((0..(LEAF * LEAVES) as i64).map(|k| (k, k))).unwrap();
            let first = arena.insert(bucket);

            let mut current = first;
            while arena[current].is_overfull() {
                current = arena.split(current, Some(LEAF)).unwrap();
            }
            arena.chain_keys(first).count()
        });
    });

    group.finish();
}

// ─── Conflict Benchmarks ────────────────────────────────────────────────────

fn bench_resolve_conflict(c: &mut Criterion) {
    let old: BucketState<i64, i64> = full_bucket().into_state();
    let committed: BucketState<i64, i64> = old.items().map(|(k, v)| (*k, if *k == 10 { -1 } else { *v })).collect();
    let new: BucketState<i64, i64> = old.items().map(|(k, v)| (*k, *v)).chain([(1_000, 0)]).collect();

    let mut group = c.benchmark_group("resolve_conflict");

    group.bench_function(BenchmarkId::new("Bucket", LEAF), |b| {
        b.iter(|| Bucket::resolve_conflict(&old, &committed, &new).unwrap());
    });

    group.finish();
}

// ─── Set Operation Benchmarks ───────────────────────────────────────────────

fn bench_set_operations(c: &mut Criterion) {
    let (twos, threes) = (stepped_set(2), stepped_set(3));
    let mut group = c.benchmark_group("set_operations");

    group.bench_function(BenchmarkId::new("union", LEAF * LEAVES), |b| {
        b.iter(|| set_ops::union(&twos, &threes));
    });

    group.bench_function(BenchmarkId::new("intersection", LEAF * LEAVES), |b| {
        b.iter(|| set_ops::intersection(&twos, &threes));
    });

    group.bench_function(BenchmarkId::new("difference", LEAF * LEAVES), |b| {
        b.iter(|| set_ops::difference(&twos, &threes));
    });

    let sets: Vec<Set<i64>> = (2..10).map(stepped_set).collect();
    let sources: Vec<&dyn KeySource<i64>> = sets.iter().map(|set| set as &dyn KeySource<i64>).collect();
    group.bench_function(BenchmarkId::new("multiunion", sources.len()), |b| {
        b.iter(|| set_ops::multiunion(&sources));
    });

    group.finish();
}

criterion_group!(leaf_benches, bench_bucket_insert_random, bench_bucket_search, bench_split_chain,);

criterion_group!(conflict_benches, bench_resolve_conflict,);

criterion_group!(set_operation_benches, bench_set_operations,);

criterion_main!(leaf_benches, conflict_benches, set_operation_benches,);
