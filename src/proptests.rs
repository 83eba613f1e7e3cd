use core::hash::BuildHasher;
use core::hash::Hasher;
use std::collections::HashMap as ModelMap;

use proptest::prelude::*;

use super::*;

/// Collapses every key onto a handful of hashes so that probe chains are
/// long, share fingerprints, and cross tombstones constantly.
#[derive(Clone, Copy, Default)]
struct FewHashes;

#[derive(Default)]
struct FewHashesHasher(u64);

impl Hasher for FewHashesHasher {
    fn finish(&self) -> u64 {
        ((self.0 % 5) << 7) | (self.0 % 3)
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 = self.0.wrapping_mul(31).wrapping_add(b as u64);
        }
    }
}

impl BuildHasher for FewHashes {
    type Hasher = FewHashesHasher;

    fn build_hasher(&self) -> Self::Hasher {
        FewHashesHasher::default()
    }
}

#[derive(Clone, Debug)]
enum Op {
    Insert(u16, u32),
    InsertIfAbsent(u16, u32),
    Remove(u16),
    Get(u16),
    Compact,
    Reset,
}

fn ops_strategy(key_space: u16) -> impl Strategy<Value = Vec<Op>> {
    let op = prop_oneof![
        35 => (0..key_space, any::<u32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        15 => (0..key_space, any::<u32>()).prop_map(|(k, v)| Op::InsertIfAbsent(k, v)),
        30 => (0..key_space).prop_map(Op::Remove),
        16 => (0..key_space).prop_map(Op::Get),
        3 => Just(Op::Compact),
        1 => Just(Op::Reset),
    ];
    prop::collection::vec(op, 0..=1500)
}

fn validate<S: BuildHasher>(
    map: &HashMap<u16, u32, S>,
    model: &ModelMap<u16, u32>,
) -> Result<(), TestCaseError> {
    let stats = map.stats();
    prop_assert_eq!(map.len(), model.len());
    prop_assert_eq!(stats.size, model.len());
    prop_assert_eq!(map.iter().count(), model.len());
    prop_assert!(stats.size + stats.tombstones <= stats.capacity);
    prop_assert!(stats.size <= stats.effective_capacity);
    for (k, v) in model {
        prop_assert_eq!(map.get(k), Some(v));
    }
    Ok(())
}

fn run<S: BuildHasher>(
    mut map: HashMap<u16, u32, S>,
    ops: Vec<Op>,
) -> Result<(), TestCaseError> {
    let mut model: ModelMap<u16, u32> = ModelMap::new();
    let effective = map.effective_capacity();

    for op in ops {
        match op {
            Op::Insert(k, v) => {
                let got = map.insert(k, v);
                if model.len() >= effective {
                    prop_assert_eq!(got, Err(Error::TableFull));
                } else {
                    prop_assert_eq!(got, Ok(model.insert(k, v)));
                }
            }
            Op::InsertIfAbsent(k, v) => {
                let got = map.insert_if_absent(k, v);
                if model.len() >= effective {
                    prop_assert_eq!(got, Err(Error::TableFull));
                } else {
                    let is_new = !model.contains_key(&k);
                    if is_new {
                        model.insert(k, v);
                    }
                    prop_assert_eq!(got, Ok(is_new));
                }
            }
            Op::Remove(k) => {
                prop_assert_eq!(map.remove(&k), model.remove(&k));
            }
            Op::Get(k) => {
                prop_assert_eq!(map.get(&k), model.get(&k));
            }
            Op::Compact => {
                prop_assert_eq!(map.compact(), Ok(()));
                prop_assert_eq!(map.tombstones(), 0);
            }
            Op::Reset => {
                map.reset();
                model.clear();
                prop_assert_eq!(map.tombstones(), 0);
            }
        }
    }

    validate(&map, &model)?;
    prop_assert_eq!(map.compact(), Ok(()));
    validate(&map, &model)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 20_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence_random_hasher(ops in ops_strategy(200)) {
        run(HashMap::<u16, u32, DefaultHashBuilder>::with_capacity(64), ops)?;
    }

    #[test]
    fn prop_equivalence_colliding_hasher(ops in ops_strategy(120)) {
        run(HashMap::<u16, u32, FewHashes>::with_capacity(64), ops)?;
    }

    #[test]
    fn prop_equivalence_single_group(ops in ops_strategy(16)) {
        run(HashMap::<u16, u32, DefaultHashBuilder>::with_capacity(8), ops)?;
    }
}
