//! chained-hashmap: a single-threaded hash map with a fixed bucket array,
//! separate chaining, and pluggable hashing, allocation and disposal.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: an embeddable map whose every structural decision is made by a
//!   strategy the caller chooses, while the chain surgery stays in safe Rust.
//! - Layers:
//!   - Chains<K, V>: bucket heads plus a generational arena (`slotmap`) the
//!     singly linked chains are threaded through. Owns probe/append/unlink.
//!   - ChainedHashMap<K, V, S, A, D>: public API. Hashes with `S`, compares
//!     with `K: Eq`, asks `A` for every block, hands released keys and
//!     values to `D`.
//!   - Traversal: guarded `for_each` (removal and stop signalled by the
//!     visitor), `retain`, and read-only iterators.
//!
//! Constraints
//! - Single-threaded: `!Send`/`!Sync` by design.
//! - Fixed bucket count chosen at construction; no resizing.
//! - Unique keys; `set` overwrites in place and keeps the `EntryId`.
//! - Reentrancy: disallowed while an operation runs; checked in debug builds.
//!
//! Allocation model
//! - Storage lives in ordinary Rust containers. The `Allocator` grants or
//!   refuses each logical block before the map commits to it: the map
//!   record, the bucket array, and one block per entry node. A refusal
//!   surfaces as `CreateError` or `SetError` and leaves no grant behind.
//!
//! Ownership and disposal
//! - Keys and values belong to the map from `set` until overwrite, `remove`,
//!   visitor removal, `clear` or drop; each of those hands them to the
//!   `Disposer` after the node is unlinked, so the structure is consistent
//!   whenever user code runs. `take` returns them to the caller instead.
//!
//! Iteration with removal
//! - The visitor never sees the map, only `&K` and `&mut V`. Structural
//!   change during a walk happens only through the returned `Visit`, and
//!   the walk reads the successor before unlinking the current node.
//!
//! Hashing
//! - Any `BuildHasher`; `fnv` ships FNV-1/FNV-1a for callers that want a
//!   seedless, run-to-run stable bucket layout.

pub mod alloc;
mod builder;
mod chained_hash_map;
mod chained_hash_map_proptest;
pub mod dispose;
mod error;
pub mod fnv;
mod reentrancy;
mod traversal;

// Public surface
pub use alloc::{Allocator, Global, TrackingAllocator};
pub use builder::{ChainedHashMapBuilder, DEFAULT_BUCKET_COUNT};
pub use chained_hash_map::{ChainedHashMap, EntryId, EntryRef};
pub use dispose::{DisposeWith, Disposer, DropDisposer};
pub use error::{AllocError, CreateError, SetError};
pub use traversal::{Iter, Visit};
