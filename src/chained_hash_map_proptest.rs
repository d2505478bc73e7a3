#![cfg(test)]

// Property tests for ChainedHashMap kept inside the crate so they can check
// structural invariants that are not part of the public API.

use crate::chained_hash_map::{ChainedHashMap, EntryId};
use crate::traversal::Visit;
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

// Pool-indexed operations so indices shrink to earlier keys.
#[derive(Clone, Debug)]
enum Op {
    Set(usize, i32),
    Get(usize),
    Remove(usize),
    Take(usize),
    Contains(String),
    Mutate(usize, i32),
    Clear,
    // Remove entries whose value is divisible by `modulus`; stop after
    // `stop_after` visits (0 = never).
    Walk { modulus: i32, stop_after: usize },
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (usize, Vec<String>, Vec<Op>)> {
    (1usize..=8, proptest::collection::vec("[a-z]{0,5}", 1..=8)).prop_flat_map(|(buckets, pool)| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Set(i, v)),
            2 => idx.clone().prop_map(Op::Get),
            2 => idx.clone().prop_map(Op::Remove),
            1 => idx.clone().prop_map(Op::Take),
            1 => prop_oneof![contains_pool, "[a-z]{0,5}"].prop_map(Op::Contains),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| Op::Mutate(i, d)),
            1 => Just(Op::Clear),
            2 => (1i32..=4, 0usize..=6).prop_map(|(modulus, stop_after)| Op::Walk { modulus, stop_after }),
        ];
        proptest::collection::vec(op, 1..60).prop_map(move |ops| (buckets, pool.clone(), ops))
    })
}

// State-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - `set` overwrites in place: the id of a live key never changes.
// - `get`/`contains_key` parity with the model; borrowed lookup via &str.
// - `remove`/`take` agree with the model and leave stale ids unresolvable.
// - guarded walks remove exactly the visited entries they flag and stop
//   after the requested number of visits, leaving the rest untouched.
// - structural invariants (bucket placement, uniqueness, reachability) and
//   len parity hold after every op.
fn run_state_machine<S>(sut: &mut ChainedHashMap<Key, i32, S>, pool: &[String], ops: Vec<Op>) -> Result<(), TestCaseError>
where
    S: BuildHasher,
{
    let mut model: HashMap<Key, i32> = HashMap::new();
    let mut live: HashMap<Key, EntryId> = HashMap::new();
    let mut stale: Vec<EntryId> = Vec::new();

    for op in ops {
        match op {
            Op::Set(i, v) => {
                let k = key_from(pool, i);
                let id = sut.set(k.clone(), v).expect("global allocator never refuses");
                if let Some(&prev) = live.get(&k) {
                    prop_assert_eq!(id, prev, "overwrite must keep the entry id");
                }
                live.insert(k.clone(), id);
                model.insert(k, v);
            }
            Op::Get(i) => {
                let k = key_from(pool, i);
                let got = sut.get(&k).map(|e| (e.id(), *e.value()));
                let want = model.get(&k).map(|v| (live[&k], *v));
                prop_assert_eq!(got, want);
            }
            Op::Remove(i) => {
                let k = key_from(pool, i);
                let removed = sut.remove(&k);
                prop_assert_eq!(removed, model.remove(&k).is_some());
                if let Some(id) = live.remove(&k) {
                    stale.push(id);
                }
            }
            Op::Take(i) => {
                let k = key_from(pool, i);
                let taken = sut.take(k.0.as_str());
                prop_assert_eq!(taken, model.remove(&k).map(|v| (k.clone(), v)));
                if let Some(id) = live.remove(&k) {
                    stale.push(id);
                }
            }
            Op::Contains(s) => {
                let has_model = model.keys().any(|k| k.0 == s);
                prop_assert_eq!(sut.contains_key(s.as_str()), has_model);
            }
            Op::Mutate(i, d) => {
                let k = key_from(pool, i);
                if let Some(v) = sut.get_value_mut(&k) {
                    *v = v.wrapping_add(d);
                    let mv = model.get_mut(&k).expect("present in model");
                    *mv = mv.wrapping_add(d);
                } else {
                    prop_assert!(!model.contains_key(&k));
                }
            }
            Op::Clear => {
                sut.clear();
                model.clear();
                stale.extend(live.drain().map(|(_, id)| id));
            }
            Op::Walk { modulus, stop_after } => {
                let order: Vec<Key> = sut.keys().cloned().collect();
                let mut visited = Vec::new();
                sut.for_each(|k, v| {
                    visited.push(k.clone());
                    Visit {
                        remove: *v % modulus == 0,
                        proceed: stop_after == 0 || visited.len() < stop_after,
                    }
                });
                let expect_visits = if stop_after == 0 { order.len() } else { stop_after.min(order.len()) };
                prop_assert_eq!(&visited[..], &order[..expect_visits]);
                for k in &visited {
                    if model[k] % modulus == 0 {
                        model.remove(k);
                        stale.push(live.remove(k).expect("tracked live id"));
                    }
                }
            }
        }

        sut.check_invariants();
        for &id in &stale {
            prop_assert!(id.value(sut).is_none(), "stale id must not resolve");
        }
        for (k, &id) in &live {
            prop_assert_eq!(id.key(sut), Some(k));
        }
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        let s_keys: BTreeSet<_> = sut.keys().cloned().collect();
        let m_keys: BTreeSet<_> = model.keys().cloned().collect();
        prop_assert_eq!(s_keys, m_keys);
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((buckets, pool, ops) in arb_scenario()) {
        let mut sut: ChainedHashMap<Key, i32> = ChainedHashMap::new(buckets).unwrap();
        run_state_machine(&mut sut, &pool, ops)?;
    }
}

// Collision variant: a constant hasher puts every key in one chain.
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

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((buckets, pool, ops) in arb_scenario()) {
        let mut sut: ChainedHashMap<Key, i32, ConstBuildHasher> =
            ChainedHashMap::with_hasher(buckets, ConstBuildHasher).unwrap();
        run_state_machine(&mut sut, &pool, ops)?;
        prop_assert_eq!(sut.chain_len(0), Some(sut.len()));
    }
}
