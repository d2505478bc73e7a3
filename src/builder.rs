//! Builder collecting the bucket count and strategies for a map.

use crate::alloc::{Allocator, Global};
use crate::chained_hash_map::ChainedHashMap;
use crate::dispose::{Disposer, DropDisposer};
use crate::error::CreateError;
use std::collections::hash_map::RandomState;

/// Bucket count used when the builder is not given one.
pub const DEFAULT_BUCKET_COUNT: usize = 1024;

/// Configure and build a `ChainedHashMap`.
///
/// ```
/// use chained_hashmap::{ChainedHashMapBuilder, fnv::BuildFnv1a32};
///
/// let mut m = ChainedHashMapBuilder::new()
///     .bucket_count(16)
///     .hasher(BuildFnv1a32)
///     .build()
///     .unwrap();
/// m.set("Alice", 25).unwrap();
/// assert_eq!(m.get_value("Alice"), Some(&25));
/// ```
#[derive(Debug, Clone)]
pub struct ChainedHashMapBuilder<S = RandomState, A = Global, D = DropDisposer> {
    bucket_count: usize,
    hasher: S,
    allocator: A,
    disposer: D,
}

impl ChainedHashMapBuilder {
    pub fn new() -> Self {
        Self {
            bucket_count: DEFAULT_BUCKET_COUNT,
            hasher: RandomState::new(),
            allocator: Global,
            disposer: DropDisposer,
        }
    }
}

impl Default for ChainedHashMapBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, A, D> ChainedHashMapBuilder<S, A, D> {
    /// Number of buckets; fixed for the map's lifetime. Zero is rejected at
    /// `build`.
    pub fn bucket_count(mut self, bucket_count: usize) -> Self {
        self.bucket_count = bucket_count;
        self
    }

    pub fn hasher<T>(self, hasher: T) -> ChainedHashMapBuilder<T, A, D> {
        ChainedHashMapBuilder {
            bucket_count: self.bucket_count,
            hasher,
            allocator: self.allocator,
            disposer: self.disposer,
        }
    }

    pub fn allocator<B: Allocator>(self, allocator: B) -> ChainedHashMapBuilder<S, B, D> {
        ChainedHashMapBuilder {
            bucket_count: self.bucket_count,
            hasher: self.hasher,
            allocator,
            disposer: self.disposer,
        }
    }

    pub fn disposer<E>(self, disposer: E) -> ChainedHashMapBuilder<S, A, E> {
        ChainedHashMapBuilder {
            bucket_count: self.bucket_count,
            hasher: self.hasher,
            allocator: self.allocator,
            disposer,
        }
    }

    pub fn build<K, V>(self) -> Result<ChainedHashMap<K, V, S, A, D>, CreateError>
    where
        A: Allocator,
        D: Disposer<K, V>,
    {
        ChainedHashMap::create(self.bucket_count, self.hasher, self.allocator, self.disposer)
    }
}
