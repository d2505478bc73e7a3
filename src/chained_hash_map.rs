//! ChainedHashMap: fixed bucket array, collisions resolved by chaining.
//!
//! Chains are singly linked lists of nodes living in a generational arena;
//! bucket heads and `next` links are `EntryId`s. Unlinking a node given its
//! predecessor is O(1), and ids of removed nodes never resolve again.

use crate::alloc::{Allocator, Global};
use crate::dispose::{Disposer, DropDisposer};
use crate::error::{AllocError, CreateError, SetError};
use crate::reentrancy::DebugReentrancy;
use core::alloc::Layout;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::mem;
use log::{debug, trace};
use slotmap::{new_key_type, SlotMap};
use std::collections::hash_map::RandomState;

new_key_type! {
    /// Stable name for one entry. Survives in-place overwrite; never
    /// resolves again once the entry is removed.
    pub struct EntryId;
}

impl EntryId {
    pub fn key<'a, K, V, S, A, D>(&self, map: &'a ChainedHashMap<K, V, S, A, D>) -> Option<&'a K>
    where
        A: Allocator,
        D: Disposer<K, V>,
    {
        map.chains.nodes.get(*self).map(|n| &n.key)
    }

    pub fn value<'a, K, V, S, A, D>(&self, map: &'a ChainedHashMap<K, V, S, A, D>) -> Option<&'a V>
    where
        A: Allocator,
        D: Disposer<K, V>,
    {
        map.chains.nodes.get(*self).map(|n| &n.value)
    }

    pub fn value_mut<'a, K, V, S, A, D>(
        &self,
        map: &'a mut ChainedHashMap<K, V, S, A, D>,
    ) -> Option<&'a mut V>
    where
        A: Allocator,
        D: Disposer<K, V>,
    {
        map.chains.nodes.get_mut(*self).map(|n| &mut n.value)
    }
}

#[derive(Debug)]
pub(crate) struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) next: Option<EntryId>,
}

enum Probe {
    Found { prev: Option<EntryId>, id: EntryId },
    Vacant { tail: Option<EntryId> },
}

/// Bucket heads plus the arena the chains are threaded through.
pub(crate) struct Chains<K, V> {
    pub(crate) buckets: Box<[Option<EntryId>]>,
    pub(crate) nodes: SlotMap<EntryId, Node<K, V>>,
    bucket_layout: Layout,
}

impl<K, V> Chains<K, V> {
    pub(crate) fn node_layout() -> Layout {
        Layout::new::<Node<K, V>>()
    }

    fn probe<Q>(&self, bucket: usize, q: &Q) -> Probe
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let mut prev = None;
        let mut cursor = self.buckets[bucket];
        while let Some(id) = cursor {
            let node = &self.nodes[id];
            if node.key.borrow() == q {
                return Probe::Found { prev, id };
            }
            prev = Some(id);
            cursor = node.next;
        }
        Probe::Vacant { tail: prev }
    }

    fn find<Q>(&self, bucket: usize, q: &Q) -> Option<EntryId>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        match self.probe(bucket, q) {
            Probe::Found { id, .. } => Some(id),
            Probe::Vacant { .. } => None,
        }
    }

    /// Make room for one more node without aborting on exhaustion.
    fn reserve_node(&mut self) -> Result<(), AllocError> {
        self.nodes
            .try_reserve(1)
            .map_err(|_| AllocError::for_layout(Self::node_layout()))
    }

    /// Unlink the node matching `q` from `bucket`, if any.
    fn detach<Q>(&mut self, bucket: usize, q: &Q) -> Option<Node<K, V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        match self.probe(bucket, q) {
            Probe::Found { prev, id } => Some(self.unlink(bucket, prev, id)),
            Probe::Vacant { .. } => None,
        }
    }

    fn append(&mut self, bucket: usize, tail: Option<EntryId>, key: K, value: V) -> EntryId {
        let id = self.nodes.insert(Node {
            key,
            value,
            next: None,
        });
        match tail {
            None => self.buckets[bucket] = Some(id),
            Some(t) => self.nodes[t].next = Some(id),
        }
        id
    }

    /// Detach `id` from `bucket`'s chain; `prev` is its predecessor, or
    /// `None` when `id` is the chain head.
    pub(crate) fn unlink(&mut self, bucket: usize, prev: Option<EntryId>, id: EntryId) -> Node<K, V> {
        let node = self
            .nodes
            .remove(id)
            .expect("chain links must only name live nodes");
        match prev {
            None => self.buckets[bucket] = node.next,
            Some(p) => self.nodes[p].next = node.next,
        }
        node
    }
}

/// Borrowed view of one entry, as returned by `get`.
#[derive(Debug)]
pub struct EntryRef<'a, K, V> {
    id: EntryId,
    key: &'a K,
    value: &'a V,
}

impl<'a, K, V> EntryRef<'a, K, V> {
    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn key(&self) -> &'a K {
        self.key
    }

    pub fn value(&self) -> &'a V {
        self.value
    }
}

/// Hash map with a fixed number of buckets and separately chained entries.
///
/// - `S` hashes keys; equality comes from `K: Eq`.
/// - `A` grants the map record, the bucket array and every entry node.
/// - `D` receives each key and value the map gives up.
///
/// The bucket count never changes; there is no resizing.
pub struct ChainedHashMap<K, V, S = RandomState, A = Global, D = DropDisposer>
where
    A: Allocator,
    D: Disposer<K, V>,
{
    pub(crate) chains: Chains<K, V>,
    hasher: S,
    pub(crate) alloc: A,
    pub(crate) disposer: D,
    pub(crate) reentrancy: DebugReentrancy,
}

impl<K, V> ChainedHashMap<K, V> {
    /// Map with `bucket_count` buckets and the default strategies.
    pub fn new(bucket_count: usize) -> Result<Self, CreateError> {
        Self::create(bucket_count, RandomState::new(), Global, DropDisposer)
    }
}

impl<K, V, S> ChainedHashMap<K, V, S> {
    pub fn with_hasher(bucket_count: usize, hasher: S) -> Result<Self, CreateError> {
        Self::create(bucket_count, hasher, Global, DropDisposer)
    }
}

impl<K, V, S, A, D> ChainedHashMap<K, V, S, A, D>
where
    A: Allocator,
    D: Disposer<K, V>,
{
    /// Build a map from explicit strategies.
    ///
    /// The allocator is asked for the map record first, then the bucket
    /// array; if the second request is refused the first grant is returned
    /// before failing. Backing memory the system cannot supply is reported
    /// the same way, with both grants returned.
    pub fn create(bucket_count: usize, hasher: S, alloc: A, disposer: D) -> Result<Self, CreateError> {
        if bucket_count == 0 {
            return Err(CreateError::ZeroBuckets);
        }
        let bucket_layout = Layout::array::<Option<EntryId>>(bucket_count)
            .map_err(|_| CreateError::CapacityOverflow(bucket_count))?;
        let record_layout = Layout::new::<Self>();

        if let Err(e) = alloc.allocate(record_layout) {
            debug!("map record refused: {e}");
            return Err(e.into());
        }
        if let Err(e) = alloc.allocate(bucket_layout) {
            alloc.deallocate(record_layout);
            debug!("bucket array of {bucket_count} slots refused: {e}");
            return Err(e.into());
        }

        let mut buckets = Vec::new();
        if buckets.try_reserve_exact(bucket_count).is_err() {
            alloc.deallocate(bucket_layout);
            alloc.deallocate(record_layout);
            debug!("backing memory for {bucket_count} buckets unavailable");
            return Err(AllocError::for_layout(bucket_layout).into());
        }
        buckets.resize(bucket_count, None);

        trace!("created chained map with {bucket_count} buckets");
        Ok(Self {
            chains: Chains {
                buckets: buckets.into_boxed_slice(),
                nodes: SlotMap::with_key(),
                bucket_layout,
            },
            hasher,
            alloc,
            disposer,
            reentrancy: DebugReentrancy::new(),
        })
    }

    pub fn len(&self) -> usize {
        self.chains.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.nodes.is_empty()
    }

    pub fn bucket_count(&self) -> usize {
        self.chains.buckets.len()
    }

    /// Number of entries chained in `bucket`, or `None` if out of range.
    pub fn chain_len(&self, bucket: usize) -> Option<usize> {
        let mut cursor = *self.chains.buckets.get(bucket)?;
        let mut n = 0;
        while let Some(id) = cursor {
            n += 1;
            cursor = self.chains.nodes[id].next;
        }
        Some(n)
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Dispose every entry. The bucket array stays and the map is reusable.
    pub fn clear(&mut self) {
        let _g = self.reentrancy.enter("clear");
        let released = self.chains.nodes.len();
        for bucket in 0..self.chains.buckets.len() {
            while let Some(head) = self.chains.buckets[bucket] {
                let node = self.chains.unlink(bucket, None, head);
                self.alloc.deallocate(Chains::<K, V>::node_layout());
                self.disposer.dispose_key(node.key);
                self.disposer.dispose_value(node.value);
            }
        }
        if released > 0 {
            trace!("cleared {released} entries");
        }
    }

    /// Tear the map down: entries, then the bucket array, then the record.
    /// Equivalent to dropping it.
    pub fn destroy(self) {
        drop(self)
    }
}

impl<K, V, S, A, D> ChainedHashMap<K, V, S, A, D>
where
    K: Eq + Hash,
    S: BuildHasher,
    A: Allocator,
    D: Disposer<K, V>,
{
    fn bucket_of<Q>(&self, q: &Q) -> usize
    where
        Q: ?Sized + Hash,
    {
        (self.hasher.hash_one(q) % self.chains.buckets.len() as u64) as usize
    }

    /// Insert, or overwrite the entry whose key equals `key`.
    ///
    /// An overwrite installs the new key and value into the existing node
    /// (same `EntryId`, same chain position) and then hands the old pair to
    /// the disposer. Installing first means the node never holds a disposed
    /// key, even if the disposer panics. A new entry is appended at the tail
    /// of its chain. If the allocator refuses the node, or the arena cannot
    /// grow, the map is unchanged and the key and value come back inside
    /// the error.
    pub fn set(&mut self, key: K, value: V) -> Result<EntryId, SetError<K, V>> {
        let _g = self.reentrancy.enter("set");
        let bucket = self.bucket_of(&key);
        match self.chains.probe(bucket, &key) {
            Probe::Found { id, .. } => {
                let node = &mut self.chains.nodes[id];
                let old_key = mem::replace(&mut node.key, key);
                let old_value = mem::replace(&mut node.value, value);
                self.disposer.dispose_key(old_key);
                self.disposer.dispose_value(old_value);
                Ok(id)
            }
            Probe::Vacant { tail } => {
                let layout = Chains::<K, V>::node_layout();
                if let Err(e) = self.alloc.allocate(layout) {
                    debug!("entry for bucket {bucket} refused: {e}");
                    return Err(SetError::new(key, value, e));
                }
                if let Err(e) = self.chains.reserve_node() {
                    self.alloc.deallocate(layout);
                    debug!("arena for bucket {bucket} cannot grow: {e}");
                    return Err(SetError::new(key, value, e));
                }
                Ok(self.chains.append(bucket, tail, key, value))
            }
        }
    }

    pub fn get<Q>(&self, q: &Q) -> Option<EntryRef<'_, K, V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("get");
        let id = self.chains.find(self.bucket_of(q), q)?;
        let node = &self.chains.nodes[id];
        Some(EntryRef {
            id,
            key: &node.key,
            value: &node.value,
        })
    }

    pub fn get_value<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get(q).map(|e| e.value())
    }

    pub fn get_value_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("get_value_mut");
        let id = self.chains.find(self.bucket_of(q), q)?;
        self.chains.nodes.get_mut(id).map(|n| &mut n.value)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("contains_key");
        self.chains.find(self.bucket_of(q), q).is_some()
    }

    /// Remove the entry for `q` and dispose its key and value.
    /// Returns whether an entry was found.
    pub fn remove<Q>(&mut self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("remove");
        let bucket = self.bucket_of(q);
        match self.chains.detach(bucket, q) {
            Some(node) => {
                self.alloc.deallocate(Chains::<K, V>::node_layout());
                self.disposer.dispose_key(node.key);
                self.disposer.dispose_value(node.value);
                true
            }
            None => false,
        }
    }

    /// Remove the entry for `q` and give its key and value back to the
    /// caller; the disposer is not involved.
    pub fn take<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("take");
        let bucket = self.bucket_of(q);
        let node = self.chains.detach(bucket, q)?;
        self.alloc.deallocate(Chains::<K, V>::node_layout());
        Some((node.key, node.value))
    }

    /// Panics if any structural invariant is broken.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        let mut reachable = 0;
        for bucket in 0..self.bucket_count() {
            let mut seen: Vec<&K> = Vec::new();
            let mut cursor = self.chains.buckets[bucket];
            while let Some(id) = cursor {
                let node = self
                    .chains
                    .nodes
                    .get(id)
                    .expect("chain names a dead node");
                assert_eq!(self.bucket_of(&node.key), bucket, "entry in wrong bucket");
                assert!(!seen.contains(&&node.key), "duplicate key in chain");
                seen.push(&node.key);
                reachable += 1;
                cursor = node.next;
            }
        }
        assert_eq!(reachable, self.len(), "unreachable nodes in arena");
    }
}

impl<K, V, S, A, D> Drop for ChainedHashMap<K, V, S, A, D>
where
    A: Allocator,
    D: Disposer<K, V>,
{
    fn drop(&mut self) {
        self.clear();
        self.alloc.deallocate(self.chains.bucket_layout);
        self.alloc.deallocate(Layout::new::<Self>());
        trace!("released chained map with {} buckets", self.chains.buckets.len());
    }
}

impl<K, V, S, A, D> fmt::Debug for ChainedHashMap<K, V, S, A, D>
where
    K: fmt::Debug,
    V: fmt::Debug,
    A: Allocator,
    D: Disposer<K, V>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter().map(|(_, k, v)| (k, v))).finish()
    }
}
