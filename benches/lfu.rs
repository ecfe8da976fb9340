use std::hint::black_box;
use std::thread;

use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use freqcache::ds::FrequencyBucketList;
use freqcache::policy::lfu::{LfuCache, LfuCore};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn filled_core(capacity: usize) -> LfuCore<u64, u64> {
    let mut cache = LfuCore::new(capacity as i64);
    for i in 0..capacity as u64 {
        cache.insert(i, i);
    }
    cache
}

/// Skewed keys: 80% of draws come from the first 20% of the key space.
fn skewed_keys(count: usize, key_space: u64, seed: u64) -> Vec<u64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let hot = (key_space / 5).max(1);
    (0..count)
        .map(|_| {
            if rng.gen_bool(0.8) {
                rng.gen_range(0..hot)
            } else {
                rng.gen_range(hot..key_space.max(hot + 1))
            }
        })
        .collect()
}

fn bench_lfu_insert_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("lfu_core");
    let ops_per_iter = 1024u64 * 2;
    group.throughput(Throughput::Elements(ops_per_iter));
    group.bench_function("insert_get", |b| {
        b.iter_batched(
            || filled_core(1024),
            |mut cache| {
                for i in 0..1024u64 {
                    cache.insert(black_box(i + 10_000), i);
                    let _ = black_box(cache.get(&black_box(i)));
                }
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_lfu_get_hotset(c: &mut Criterion) {
    let mut group = c.benchmark_group("lfu_core");
    group.throughput(Throughput::Elements(4096));
    group.bench_function("get_hotset", |b| {
        b.iter_batched(
            || filled_core(4096),
            |mut cache| {
                for i in 0..4096u64 {
                    let _ = black_box(cache.get(&black_box(i)));
                }
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_lfu_eviction_churn_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("lfu_eviction_churn_sizes");
    for &capacity in &[256usize, 1024, 4096, 16384] {
        let inserts = capacity * 4;
        group.throughput(Throughput::Elements(inserts as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(capacity),
            &capacity,
            |b, &capacity| {
                b.iter_batched(
                    || filled_core(capacity),
                    |mut cache| {
                        for i in 0..inserts as u64 {
                            cache.insert(black_box(1_000_000 + i), i);
                        }
                    },
                    BatchSize::SmallInput,
                )
            },
        );
    }
    group.finish();
}

fn bench_lfu_skewed_workload(c: &mut Criterion) {
    let mut group = c.benchmark_group("lfu_skewed");
    let keys = skewed_keys(8192, 16_384, 42);
    group.throughput(Throughput::Elements(keys.len() as u64));
    group.bench_function("get_or_set", |b| {
        b.iter_batched(
            || LfuCore::<u64, u64>::new(1024),
            |mut cache| {
                for &key in &keys {
                    if cache.get(&key).is_none() {
                        cache.insert(key, key);
                    }
                }
                black_box(cache.len())
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_lfu_evict_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("lfu_core");
    for &batch in &[1i64, 64, 1024] {
        group.bench_with_input(BenchmarkId::new("evict", batch), &batch, |b, &batch| {
            b.iter_batched(
                || {
                    let mut cache = filled_core(4096);
                    for i in (0..4096u64).step_by(3) {
                        cache.get(&i);
                    }
                    cache
                },
                |mut cache| black_box(cache.evict(black_box(batch))),
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_bucket_list_increment(c: &mut Criterion) {
    c.bench_function("frequency_buckets_increment", |b| {
        b.iter_batched(
            || {
                let mut list = FrequencyBucketList::with_capacity(4096);
                let ids: Vec<_> = (0..4096u64).map(|i| list.place_new(i, ())).collect();
                (list, ids)
            },
            |(mut list, ids)| {
                for id in &ids {
                    let _ = black_box(list.increment(*id));
                }
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_concurrent_mixed(c: &mut Criterion) {
    let mut group = c.benchmark_group("lfu_concurrent");
    let threads = 4usize;
    let ops_per_thread = 2048usize;
    group.throughput(Throughput::Elements((threads * ops_per_thread) as u64));
    let workloads: Vec<_> = (0..threads)
        .map(|t| skewed_keys(ops_per_thread, 8192, t as u64))
        .collect();

    group.bench_function("mixed_4_threads", |b| {
        b.iter(|| {
            let cache: LfuCache<u64, u64> = LfuCache::new(1024);
            thread::scope(|scope| {
                for keys in &workloads {
                    let cache = cache.clone();
                    scope.spawn(move || {
                        for &key in keys {
                            if cache.get(&key).is_none() {
                                cache.set(key, key);
                            }
                        }
                    });
                }
            });
            black_box(cache.size())
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_lfu_insert_get,
    bench_lfu_get_hotset,
    bench_lfu_eviction_churn_sizes,
    bench_lfu_skewed_workload,
    bench_lfu_evict_batch,
    bench_bucket_list_increment,
    bench_concurrent_mixed,
);
criterion_main!(benches);
