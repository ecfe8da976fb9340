// ==============================================
// LFU BEHAVIORAL PROPERTIES (integration)
// ==============================================
//
// Random Set/Get/Evict sequences checked against a simple model of the
// cache: a map from key to (value, frequency, arrival tick).

use std::collections::HashMap;

use freqcache::policy::lfu::LfuCore;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Set(u8, u32),
    Get(u8),
    Evict(i64),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        5 => (0u8..24, any::<u32>()).prop_map(|(k, v)| Op::Set(k, v)),
        5 => (0u8..24).prop_map(Op::Get),
        1 => (-3i64..6).prop_map(Op::Evict),
    ]
}

/// Reference model. `tick` records when an entry arrived at its current
/// frequency; the victim is the lowest (frequency, tick).
#[derive(Default)]
struct Model {
    entries: HashMap<u8, (u32, u64, u64)>,
    tick: u64,
}

impl Model {
    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn victim(&self) -> Option<u8> {
        self.entries
            .iter()
            .min_by_key(|(_, (_, freq, tick))| (*freq, *tick))
            .map(|(k, _)| *k)
    }

    fn touch(&mut self, key: u8) {
        let tick = self.next_tick();
        if let Some(slot) = self.entries.get_mut(&key) {
            slot.1 += 1;
            slot.2 = tick;
        }
    }
}

proptest! {
    /// Property: cache agrees with the model on contents, values,
    /// frequencies and victim identity after every operation
    #[cfg_attr(miri, ignore)]
    #[test]
    fn prop_matches_reference_model(
        capacity in 0i64..10,
        ops in prop::collection::vec(op_strategy(), 0..300)
    ) {
        let mut cache: LfuCore<u8, u32> = LfuCore::new(capacity);
        let mut model = Model::default();

        for op in ops {
            match op {
                Op::Set(k, v) => {
                    if model.entries.contains_key(&k) {
                        model.touch(k);
                        model.entries.get_mut(&k).unwrap().0 = v;
                    } else {
                        if capacity > 0 && model.entries.len() >= capacity as usize {
                            let victim = model.victim().unwrap();
                            model.entries.remove(&victim);
                        }
                        let tick = model.next_tick();
                        model.entries.insert(k, (v, 1, tick));
                    }
                    cache.insert(k, v);
                },
                Op::Get(k) => {
                    let expected = model.entries.get(&k).map(|(v, _, _)| *v);
                    model.touch(k);
                    prop_assert_eq!(cache.get(&k).copied(), expected);
                },
                Op::Evict(n) => {
                    let mut expected = Vec::new();
                    for _ in 0..n.max(0) {
                        let Some(victim) = model.victim() else { break };
                        let (v, _, _) = model.entries.remove(&victim).unwrap();
                        expected.push((victim, v));
                    }
                    prop_assert_eq!(cache.evict(n), expected);
                },
            }

            prop_assert!(cache.check_invariants().is_ok());
            prop_assert_eq!(cache.len(), model.entries.len());
            for (k, (v, freq, _)) in &model.entries {
                prop_assert_eq!(cache.peek(k), Some(v));
                prop_assert_eq!(cache.frequency(k), Some(*freq));
            }
            prop_assert_eq!(cache.peek_lfu().map(|(k, _)| *k), model.victim());
        }
    }

    /// Property: bucket frequencies strictly increase, no bucket is empty,
    /// and bucket sizes sum to the cache size
    #[cfg_attr(miri, ignore)]
    #[test]
    fn prop_bucket_sequence_well_formed(
        ops in prop::collection::vec(op_strategy(), 0..300)
    ) {
        let mut cache: LfuCore<u8, u32> = LfuCore::new(12);
        for op in ops {
            match op {
                Op::Set(k, v) => { cache.insert(k, v); },
                Op::Get(k) => { cache.get(&k); },
                Op::Evict(n) => { cache.evict(n); },
            }

            let buckets: Vec<_> = cache.buckets().collect();
            prop_assert!(buckets.windows(2).all(|w| w[0].0 < w[1].0));
            prop_assert!(buckets.iter().all(|(_, members)| *members > 0));
            prop_assert_eq!(buckets.iter().map(|(_, m)| m).sum::<usize>(), cache.len());
            prop_assert!(cache.len() <= 12);
        }
    }

    /// Property: distinct inserts up to capacity are all retained
    #[cfg_attr(miri, ignore)]
    #[test]
    fn prop_unique_inserts_within_capacity_are_kept(
        capacity in 1i64..64,
        count in 0usize..64
    ) {
        let mut cache = LfuCore::new(capacity);
        let n = count.min(capacity as usize);
        for k in 0..n {
            cache.insert(k, k);
        }
        prop_assert_eq!(cache.len(), n);

        // one more distinct key at capacity evicts exactly one
        if n == capacity as usize {
            cache.insert(usize::MAX, 0);
            prop_assert_eq!(cache.len(), n);
            prop_assert!(!cache.contains(&0));
        }
    }

    /// Property: a miss never changes size or bucket layout
    #[cfg_attr(miri, ignore)]
    #[test]
    fn prop_get_miss_has_no_side_effects(
        keys in prop::collection::vec(0u8..100, 0..50),
        probe in 100u8..=255
    ) {
        let mut cache = LfuCore::new(20);
        for k in keys {
            cache.insert(k, ());
            cache.get(&k);
        }
        let before: Vec<_> = cache.buckets().collect();
        let len = cache.len();

        prop_assert!(cache.get(&probe).is_none());
        prop_assert_eq!(cache.len(), len);
        prop_assert_eq!(cache.buckets().collect::<Vec<_>>(), before);
    }
}
