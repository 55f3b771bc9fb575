#![cfg(test)]

// Property tests for ChainedHashTable kept inside the crate so they can
// run the same scenarios under a colliding hasher and a small capacity cap.

use crate::{ChainedHashTable, TableConfig};
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::hash::{BuildHasher, Hasher};

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    Remove(usize),
    Find(usize),
    Contains(String),
    Mutate(usize, i32),
    Iterate,
    Walk,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=24).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            3 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            2 => idx.clone().prop_map(OpI::Remove),
            1 => idx.clone().prop_map(OpI::Find),
            1 => prop_oneof![
                contains_pool.prop_map(|s: String| s),
                "[a-z]{0,5}".prop_map(|s| s)
            ]
            .prop_map(OpI::Contains),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            1 => Just(OpI::Iterate),
            1 => Just(OpI::Walk),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// Drive `sut` and a std HashMap model through the same operations.
// Invariants checked after every op:
// - `len` parity with the model; load factor equals len / capacity.
// - Capacity never shrinks and never exceeds the configured cap.
// - Every live key sits in bucket `hash % capacity`.
// - Iteration and manual cursor walks visit each live entry exactly once.
fn run_state_machine<S>(
    mut sut: ChainedHashTable<Key, i32, S>,
    pool: &[String],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError>
where
    S: BuildHasher,
{
    let mut model: HashMap<Key, i32> = HashMap::new();
    let mut last_capacity = sut.capacity();

    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = key_from(pool, i);
                let expected = model.insert(k.clone(), v);
                prop_assert_eq!(sut.insert(k, v), expected);
            }
            OpI::Remove(i) => {
                let k = key_from(pool, i);
                let expected = model.remove(&k);
                let got = sut.remove(&k);
                prop_assert_eq!(got.as_ref().map(|(_, v)| *v), expected);
                if let Some((kk, _)) = got {
                    prop_assert!(kk == k);
                }
                prop_assert!(sut.find(&k) == sut.end());
            }
            OpI::Find(i) => {
                let k = key_from(pool, i);
                let c = sut.find(&k);
                match model.get(&k) {
                    Some(v) => {
                        prop_assert_eq!(c.get().ok(), Some((&k, v)));
                    }
                    None => prop_assert!(c.is_end()),
                }
            }
            OpI::Contains(s) => {
                let has = sut.contains_key(s.as_str());
                let has_model = model.keys().any(|k| k.0 == s);
                prop_assert_eq!(has, has_model);
            }
            OpI::Mutate(i, d) => {
                let k = key_from(pool, i);
                match (sut.get_mut(&k), model.get_mut(&k)) {
                    (Some(sv), Some(mv)) => {
                        *sv = sv.saturating_add(d);
                        *mv = mv.saturating_add(d);
                    }
                    (None, None) => {}
                    _ => prop_assert!(false, "get_mut presence diverged from model"),
                }
            }
            OpI::Iterate => {
                let s_pairs: BTreeSet<_> = sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
                let m_pairs: BTreeSet<_> = model.iter().map(|(k, v)| (k.clone(), *v)).collect();
                prop_assert_eq!(sut.iter().count(), sut.len());
                prop_assert_eq!(s_pairs, m_pairs);
            }
            OpI::Walk => {
                let mut seen = BTreeSet::new();
                let mut c = sut.begin();
                while c != sut.end() {
                    let key = c.key().expect("cursor before end dereferences");
                    prop_assert!(seen.insert(key.clone()), "entry visited twice");
                    c.advance();
                }
                prop_assert_eq!(seen.len(), model.len());
            }
        }

        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert!(sut.capacity() >= last_capacity, "capacity shrank");
        prop_assert!(sut.capacity() <= sut.config().max_capacity());
        last_capacity = sut.capacity();
        if sut.capacity() == 0 {
            prop_assert_eq!(sut.load_factor(), 0.0);
        } else {
            prop_assert_eq!(sut.load_factor(), sut.len() as f32 / sut.capacity() as f32);
        }

        let mut c = sut.begin();
        while let Ok(key) = c.key() {
            let bucket = (sut.hasher().hash_one(key) % sut.capacity() as u64) as usize;
            prop_assert_eq!(c.bucket(), Some(bucket));
            c.advance();
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run_state_machine(ChainedHashTable::new(), &pool, ops)?;
    }

    // Small cap: tables saturate quickly and chains grow past the depth limit.
    #[test]
    fn prop_state_machine_capped((pool, ops) in arb_scenario()) {
        let cfg = TableConfig::default().with_max_capacity(4).unwrap();
        run_state_machine(ChainedHashTable::with_config(cfg), &pool, ops)?;
    }

    // Worst case: every key collides into one bucket chain.
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        let cfg = TableConfig::default().with_max_capacity(8).unwrap();
        let sut = ChainedHashTable::with_config_and_hasher(cfg, ConstBuildHasher);
        run_state_machine(sut, &pool, ops)?;
    }
}
