use core::hash::Hash;
use core::hash::Hasher;
use core::hint::black_box;

use criterion::AxisScale;
use criterion::BatchSize;
use criterion::Criterion;
use criterion::PlotConfiguration;
use criterion::Throughput;
use criterion::criterion_group;
use criterion::criterion_main;
use hashbrown::hash_table::Entry as HashbrownEntry;
use hashbrown::hash_table::HashTable as HashbrownHashTable;
use rand::Rng;
use rand::SeedableRng;
use rand::TryRngCore;
use rand::rngs::OsRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand_distr::Zipf;
use siphasher::sip::SipHasher;
use stable_swiss::hash_table::Entry as SwissEntry;
use stable_swiss::hash_table::HashTable as SwissHashTable;

trait KeyValuePair: Clone {
    fn new(key: u64) -> Self;

    fn hash_key(&self) -> u64;
    fn eq_key(&self, other: &Self) -> bool;
}

#[derive(Clone)]
struct TestItem {
    key: String,
    _value: u64,
}

impl KeyValuePair for TestItem {
    fn new(key: u64) -> Self {
        black_box(Self {
            key: format!("key_{:016X}", key),
            _value: key,
        })
    }

    fn hash_key(&self) -> u64 {
        let mut hasher = SipHasher::new();
        self.key.hash(&mut hasher);
        hasher.finish()
    }

    fn eq_key(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

#[derive(Clone)]
struct SmallTestItem {
    key: u64,
}

impl KeyValuePair for SmallTestItem {
    fn new(key: u64) -> Self {
        black_box(Self { key })
    }

    fn hash_key(&self) -> u64 {
        let mut hasher = SipHasher::new();
        self.key.hash(&mut hasher);
        hasher.finish()
    }

    fn eq_key(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

const SIZES: &[usize] = &[
    (1 << 10),
    (1 << 12),
    (1 << 14),
    (1 << 16),
    (1 << 18),
];

/// Random items, enough to fill a table sized from `size` to its ceiling.
fn random_items<TestItem: KeyValuePair>(count: usize) -> Vec<(u64, TestItem)> {
    let mut rng = OsRng;
    (0..count)
        .map(|_| {
            let key = rng.try_next_u64().unwrap();
            let item = TestItem::new(key);
            let hash = item.hash_key();
            (hash, item)
        })
        .collect()
}

fn filled_swiss<TestItem: KeyValuePair>(
    size: usize,
    items: &[(u64, TestItem)],
) -> SwissHashTable<TestItem> {
    let mut table = SwissHashTable::with_capacity(size);
    for (hash, item) in items.iter().cloned() {
        if let Ok(SwissEntry::Vacant(entry)) = table.entry(hash, |v| v.eq_key(&item)) {
            entry.insert(item);
        }
    }
    table
}

fn filled_hashbrown<TestItem: KeyValuePair>(
    size: usize,
    items: &[(u64, TestItem)],
) -> HashbrownHashTable<TestItem> {
    let mut table = HashbrownHashTable::with_capacity(size);
    for (hash, item) in items.iter().cloned() {
        if let HashbrownEntry::Vacant(entry) = table.entry(hash, |v| v.eq_key(&item), |v| v.hash_key())
        {
            entry.insert(item);
        }
    }
    table
}

fn bench_fill<TestItem: KeyValuePair, const MAX_SIZE: usize>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!("fill_{}", core::any::type_name::<TestItem>()));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for size in SIZES[..=MAX_SIZE].iter() {
        let count = SwissHashTable::<TestItem>::with_capacity(*size).effective_capacity();
        let hash_and_item = random_items::<TestItem>(count);

        group.throughput(Throughput::Elements(count as u64));
        group.bench_function(format!("stable_swiss/{size}"), |b| {
            b.iter_batched(
                || hash_and_item.clone(),
                |hash_and_item| {
                    let mut table = SwissHashTable::<TestItem>::with_capacity(*size);
                    for (hash, item) in hash_and_item {
                        match table.entry(hash, |v| v.eq_key(&item)) {
                            Ok(SwissEntry::Vacant(entry)) => {
                                black_box(entry.insert(item));
                            }
                            Ok(SwissEntry::Occupied(_)) | Err(_) => unreachable!(),
                        }
                    }
                    black_box(table)
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function(format!("hashbrown/{size}"), |b| {
            b.iter_batched(
                || hash_and_item.clone(),
                |hash_and_item| {
                    let mut table = HashbrownHashTable::<TestItem>::with_capacity(*size);
                    for (hash, item) in hash_and_item {
                        match table.entry(hash, |v| v.eq_key(&item), |v| v.hash_key()) {
                            HashbrownEntry::Vacant(entry) => {
                                black_box(entry.insert(item));
                            }
                            HashbrownEntry::Occupied(_) => unreachable!(),
                        }
                    }
                    black_box(table)
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_find_hit_miss<TestItem: KeyValuePair, const MAX_SIZE: usize>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!(
        "find_hit_miss_{}",
        core::any::type_name::<TestItem>()
    ));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for size in SIZES[..=MAX_SIZE].iter() {
        let count = SwissHashTable::<TestItem>::with_capacity(*size).effective_capacity();
        let present = random_items::<TestItem>(count);
        let absent = random_items::<TestItem>(count);

        let swiss = filled_swiss(*size, &present);
        let hashbrown = filled_hashbrown(*size, &present);

        let mut probes = present
            .iter()
            .chain(absent.iter())
            .cloned()
            .collect::<Vec<_>>();
        probes.shuffle(&mut SmallRng::from_os_rng());

        group.throughput(Throughput::Elements(probes.len() as u64));
        group.bench_function(format!("stable_swiss/{size}"), |b| {
            b.iter(|| {
                for (hash, item) in probes.iter() {
                    black_box(swiss.find(*hash, |v| v.eq_key(item)));
                }
            })
        });

        group.bench_function(format!("hashbrown/{size}"), |b| {
            b.iter(|| {
                for (hash, item) in probes.iter() {
                    black_box(hashbrown.find(*hash, |v| v.eq_key(item)));
                }
            })
        });
    }

    group.finish();
}

fn bench_find_zipf<TestItem: KeyValuePair, const MAX_SIZE: usize>(c: &mut Criterion) {
    for exponent in [1.0, 1.3] {
        let mut group = c.benchmark_group(format!(
            "find_zipf_{:.01}_{}",
            exponent,
            core::any::type_name::<TestItem>()
        ));
        group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

        for size in SIZES[..=MAX_SIZE].iter() {
            let count = SwissHashTable::<TestItem>::with_capacity(*size).effective_capacity();
            let present = random_items::<TestItem>(count);

            let swiss = filled_swiss(*size, &present);
            let hashbrown = filled_hashbrown(*size, &present);

            let mut rng = SmallRng::from_os_rng();
            let distr = Zipf::new(count as f64, exponent).unwrap();
            let probes = (0..count)
                .map(|_| {
                    let rank = rng.sample(distr) as usize;
                    present[rank.saturating_sub(1).min(count - 1)].clone()
                })
                .collect::<Vec<_>>();

            group.throughput(Throughput::Elements(probes.len() as u64));
            group.bench_function(format!("stable_swiss/{size}"), |b| {
                b.iter(|| {
                    for (hash, item) in probes.iter() {
                        black_box(swiss.find(*hash, |v| v.eq_key(item)));
                    }
                })
            });

            group.bench_function(format!("hashbrown/{size}"), |b| {
                b.iter(|| {
                    for (hash, item) in probes.iter() {
                        black_box(hashbrown.find(*hash, |v| v.eq_key(item)));
                    }
                })
            });
        }

        group.finish();
    }
}

fn bench_remove_half<TestItem: KeyValuePair, const MAX_SIZE: usize>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!(
        "remove_half_{}",
        core::any::type_name::<TestItem>()
    ));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for size in SIZES[..=MAX_SIZE].iter() {
        let count = SwissHashTable::<TestItem>::with_capacity(*size).effective_capacity();
        let present = random_items::<TestItem>(count);
        let swiss = filled_swiss(*size, &present);
        let hashbrown = filled_hashbrown(*size, &present);
        let victims = present[..count / 2].to_vec();

        group.throughput(Throughput::Elements(victims.len() as u64));
        group.bench_function(format!("stable_swiss/{size}"), |b| {
            b.iter_batched(
                || swiss.clone(),
                |mut table| {
                    for (hash, item) in victims.iter() {
                        black_box(table.remove(*hash, |v| v.eq_key(item)));
                    }
                    black_box(table)
                },
                BatchSize::LargeInput,
            )
        });

        group.bench_function(format!("hashbrown/{size}"), |b| {
            b.iter_batched(
                || hashbrown.clone(),
                |mut table| {
                    for (hash, item) in victims.iter() {
                        if let Ok(entry) = table.find_entry(*hash, |v| v.eq_key(item)) {
                            black_box(entry.remove());
                        }
                    }
                    black_box(table)
                },
                BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

fn bench_compact<TestItem: KeyValuePair, const MAX_SIZE: usize>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!("compact_{}", core::any::type_name::<TestItem>()));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for size in SIZES[..=MAX_SIZE].iter() {
        let count = SwissHashTable::<TestItem>::with_capacity(*size).effective_capacity();
        let present = random_items::<TestItem>(count);

        for removed_percent in [10usize, 50, 90] {
            let mut table = filled_swiss(*size, &present);
            for (hash, item) in present[..count * removed_percent / 100].iter() {
                table.remove(*hash, |v| v.eq_key(item));
            }

            group.throughput(Throughput::Elements(table.capacity() as u64));
            group.bench_function(format!("stable_swiss/{removed_percent}%/{size}"), |b| {
                b.iter_batched(
                    || table.clone(),
                    |mut table| {
                        table.compact(|v| v.hash_key()).unwrap();
                        black_box(table)
                    },
                    BatchSize::LargeInput,
                )
            });
        }
    }

    group.finish();
}

fn bench_churn<TestItem: KeyValuePair, const MAX_SIZE: usize>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!("churn_{}", core::any::type_name::<TestItem>()));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for size in SIZES[..=MAX_SIZE].iter() {
        let count = SwissHashTable::<TestItem>::with_capacity(*size).effective_capacity();
        let mut rng = SmallRng::from_os_rng();

        // Twice the key space of the table: about half the operations
        // toggle a live key out, the rest toggle a new one in.
        let operations = (0..count * 4)
            .map(|_| {
                let item = TestItem::new(rng.random_range(0..count as u64 * 2));
                (item.hash_key(), item)
            })
            .collect::<Vec<_>>();

        group.throughput(Throughput::Elements(operations.len() as u64));
        group.bench_function(format!("stable_swiss/{size}"), |b| {
            b.iter_batched(
                || operations.clone(),
                |operations| {
                    let mut table = SwissHashTable::<TestItem>::with_capacity(*size);
                    for (hash, item) in operations {
                        if table.tombstones() > table.capacity() / 4 {
                            table.compact(|v| v.hash_key()).unwrap();
                        }
                        match table.entry(hash, |v| v.eq_key(&item)) {
                            Ok(SwissEntry::Vacant(entry)) => {
                                entry.insert(item);
                            }
                            Ok(SwissEntry::Occupied(entry)) => {
                                black_box(entry.remove());
                            }
                            Err(_) => {
                                black_box(table.remove(hash, |v| v.eq_key(&item)));
                            }
                        }
                    }
                    black_box(table)
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function(format!("hashbrown/{size}"), |b| {
            b.iter_batched(
                || operations.clone(),
                |operations| {
                    let mut table = HashbrownHashTable::<TestItem>::with_capacity(*size);
                    for (hash, item) in operations {
                        match table.entry(hash, |v| v.eq_key(&item), |v| v.hash_key()) {
                            HashbrownEntry::Vacant(entry) => {
                                entry.insert(item);
                            }
                            HashbrownEntry::Occupied(entry) => {
                                black_box(entry.remove().0);
                            }
                        }
                    }
                    black_box(table)
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_fill::<SmallTestItem, 4>,
    bench_fill::<TestItem, 4>,
    bench_find_hit_miss::<SmallTestItem, 4>,
    bench_find_hit_miss::<TestItem, 4>,
    bench_find_zipf::<SmallTestItem, 4>,
    bench_find_zipf::<TestItem, 3>,
    bench_remove_half::<SmallTestItem, 4>,
    bench_remove_half::<TestItem, 3>,
    bench_compact::<SmallTestItem, 4>,
    bench_compact::<TestItem, 3>,
    bench_churn::<SmallTestItem, 4>,
    bench_churn::<TestItem, 3>,
);

criterion_main!(benches);
