//! Traversal: guarded `for_each`, `retain`, and read-only iterators.
//!
//! All traversals walk buckets in index order and each chain from head to
//! tail. The order depends only on the map's current state, not on insertion
//! order across buckets.

use crate::alloc::Allocator;
use crate::chained_hash_map::{Chains, ChainedHashMap, EntryId, Node};
use crate::dispose::Disposer;
use slotmap::SlotMap;

/// What `for_each` should do after visiting an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Visit {
    /// Keep walking after this entry.
    pub proceed: bool,
    /// Remove this entry (its key and value go to the disposer).
    pub remove: bool,
}

impl Visit {
    pub const CONTINUE: Visit = Visit {
        proceed: true,
        remove: false,
    };
    pub const REMOVE: Visit = Visit {
        proceed: true,
        remove: true,
    };
    pub const STOP: Visit = Visit {
        proceed: false,
        remove: false,
    };
    pub const REMOVE_AND_STOP: Visit = Visit {
        proceed: false,
        remove: true,
    };
}

impl Default for Visit {
    fn default() -> Self {
        Visit::CONTINUE
    }
}

impl<K, V, S, A, D> ChainedHashMap<K, V, S, A, D>
where
    A: Allocator,
    D: Disposer<K, V>,
{
    /// Visit every entry, letting the visitor request removal or an early
    /// stop through the returned `Visit`.
    ///
    /// Removal is carried out by the traversal itself: the current node is
    /// unlinked using the traversal's own predecessor, released and disposed,
    /// and the walk continues with the node that followed it. Stopping ends
    /// the walk right after the current entry, even if it was removed.
    ///
    /// The visitor only ever sees a key and a value, never the map.
    pub fn for_each<F>(&mut self, mut visit: F)
    where
        F: FnMut(&K, &mut V) -> Visit,
    {
        let _g = self.reentrancy.enter("for_each");
        for bucket in 0..self.chains.buckets.len() {
            let mut prev: Option<EntryId> = None;
            let mut cursor = self.chains.buckets[bucket];
            while let Some(id) = cursor {
                let node = &mut self.chains.nodes[id];
                let signal = visit(&node.key, &mut node.value);
                cursor = node.next;
                if signal.remove {
                    let node = self.chains.unlink(bucket, prev, id);
                    self.alloc.deallocate(Chains::<K, V>::node_layout());
                    self.disposer.dispose_key(node.key);
                    self.disposer.dispose_value(node.value);
                } else {
                    prev = Some(id);
                }
                if !signal.proceed {
                    return;
                }
            }
        }
    }

    /// Keep only the entries for which `keep` returns true.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        self.for_each(|k, v| if keep(k, v) { Visit::CONTINUE } else { Visit::REMOVE });
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            buckets: &self.chains.buckets,
            nodes: &self.chains.nodes,
            next_bucket: 0,
            cursor: None,
            remaining: self.chains.nodes.len(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(_, k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, _, v)| v)
    }
}

/// Iterator over `(EntryId, &K, &V)` in bucket, then chain, order.
pub struct Iter<'a, K, V> {
    buckets: &'a [Option<EntryId>],
    nodes: &'a SlotMap<EntryId, Node<K, V>>,
    next_bucket: usize,
    cursor: Option<EntryId>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (EntryId, &'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(id) = self.cursor {
                let nodes = self.nodes;
                let node = &nodes[id];
                self.cursor = node.next;
                self.remaining -= 1;
                return Some((id, &node.key, &node.value));
            }
            let head = *self.buckets.get(self.next_bucket)?;
            self.next_bucket += 1;
            self.cursor = head;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::{Global, TrackingAllocator};
    use crate::dispose::{DisposeWith, DropDisposer};
    use crate::fnv::BuildFnv1a64;
    use std::cell::RefCell;
    use std::collections::BTreeSet;
    use std::collections::hash_map::RandomState;

    fn filled(n: u32, buckets: usize) -> ChainedHashMap<u32, u32, BuildFnv1a64> {
        let mut m = ChainedHashMap::with_hasher(buckets, BuildFnv1a64).unwrap();
        for k in 0..n {
            m.set(k, k * 2).unwrap();
        }
        m
    }

    /// Invariant: with no signals, every entry is visited exactly once and in
    /// the same order `iter` reports.
    #[test]
    fn visits_every_entry_once_in_iter_order() {
        let mut m = filled(50, 7);
        let expected: Vec<u32> = m.keys().copied().collect();
        let mut seen = Vec::new();
        m.for_each(|k, _| {
            seen.push(*k);
            Visit::CONTINUE
        });
        assert_eq!(seen, expected);
        assert_eq!(seen.iter().copied().collect::<BTreeSet<_>>().len(), 50);
        assert_eq!(m.len(), 50);
    }

    /// Invariant: removing every other visited entry neither skips nor
    /// revisits successors, including consecutive removals in one chain.
    #[test]
    fn removal_during_walk_keeps_successors() {
        let mut m = filled(40, 3);
        let mut visited = 0;
        m.for_each(|k, _| {
            visited += 1;
            if k % 2 == 0 || k % 5 == 0 {
                Visit::REMOVE
            } else {
                Visit::CONTINUE
            }
        });
        assert_eq!(visited, 40);
        m.check_invariants();
        let left: BTreeSet<u32> = m.keys().copied().collect();
        let expected: BTreeSet<u32> = (0..40).filter(|k| k % 2 != 0 && k % 5 != 0).collect();
        assert_eq!(left, expected);
    }

    /// Invariant: a stop signal after N visits leaves every unvisited entry
    /// in place.
    #[test]
    fn stop_halts_after_current_entry() {
        let mut m = filled(30, 5);
        let mut seen = Vec::new();
        m.for_each(|k, _| {
            seen.push(*k);
            if seen.len() == 4 {
                Visit::STOP
            } else {
                Visit::CONTINUE
            }
        });
        assert_eq!(seen.len(), 4);
        assert_eq!(m.len(), 30);
    }

    /// Invariant: remove-and-stop removes the current entry, then halts.
    #[test]
    fn remove_and_stop() {
        let mut m = filled(10, 2);
        let first = *m.keys().next().unwrap();
        let mut calls = 0;
        m.for_each(|_, _| {
            calls += 1;
            Visit::REMOVE_AND_STOP
        });
        assert_eq!(calls, 1);
        assert_eq!(m.len(), 9);
        assert!(!m.contains_key(&first));
        m.check_invariants();
    }

    /// Invariant: entries removed by the walk release their node grant and
    /// go through the disposer.
    #[test]
    fn removal_releases_and_disposes() {
        let alloc = TrackingAllocator::new();
        let disposed = RefCell::new(Vec::new());
        let d = DisposeWith::new(drop::<u8>, |v: String| disposed.borrow_mut().push(v));
        let mut m = ChainedHashMap::create(4, RandomState::new(), &alloc, &d).unwrap();
        for k in 0..6u8 {
            m.set(k, format!("v{k}")).unwrap();
        }
        assert_eq!(alloc.live_blocks(), 8);
        m.for_each(|k, _| if *k < 3 { Visit::REMOVE } else { Visit::CONTINUE });
        assert_eq!(alloc.live_blocks(), 5);
        let mut got = disposed.borrow().clone();
        got.sort();
        assert_eq!(got, ["v0", "v1", "v2"]);
    }

    #[test]
    fn visitor_can_mutate_values() {
        let mut m = filled(5, 2);
        m.for_each(|_, v| {
            *v += 1;
            Visit::default()
        });
        let mut vals: Vec<u32> = m.values().copied().collect();
        vals.sort();
        assert_eq!(vals, [1, 3, 5, 7, 9]);
    }

    #[test]
    fn retain_filters_entries() {
        let mut m: ChainedHashMap<u32, u32, _, Global, DropDisposer> = filled(20, 4);
        m.retain(|k, _| k % 3 == 0);
        let left: BTreeSet<u32> = m.keys().copied().collect();
        assert_eq!(left, (0..20).filter(|k| k % 3 == 0).collect::<BTreeSet<u32>>());
    }

    #[test]
    fn iter_reports_exact_len() {
        let m = filled(12, 5);
        let it = m.iter();
        assert_eq!(it.len(), 12);
        assert_eq!(it.count(), 12);
        let empty = filled(0, 3);
        assert_eq!(empty.iter().next(), None);
    }
}
