//! Allocation strategy consulted by the map for every structural block.
//!
//! The map stores its nodes and buckets in ordinary Rust containers; the
//! `Allocator` is the authority that grants or refuses each block before the
//! map commits to it. Every successful `allocate` is matched by exactly one
//! `deallocate` with the same `Layout`:
//! - one block for the map record, held for the map's lifetime;
//! - one block for the bucket array, held for the map's lifetime;
//! - one block per live entry node.

use crate::error::AllocError;
use core::alloc::Layout;
use core::cell::Cell;
use std::rc::Rc;

pub trait Allocator {
    /// Grant or refuse a block described by `layout`.
    fn allocate(&self, layout: Layout) -> Result<(), AllocError>;

    /// Release a block previously granted for `layout`.
    fn deallocate(&self, layout: Layout);
}

impl<A: Allocator + ?Sized> Allocator for &A {
    #[inline]
    fn allocate(&self, layout: Layout) -> Result<(), AllocError> {
        (**self).allocate(layout)
    }

    #[inline]
    fn deallocate(&self, layout: Layout) {
        (**self).deallocate(layout)
    }
}

impl<A: Allocator + ?Sized> Allocator for Rc<A> {
    #[inline]
    fn allocate(&self, layout: Layout) -> Result<(), AllocError> {
        (**self).allocate(layout)
    }

    #[inline]
    fn deallocate(&self, layout: Layout) {
        (**self).deallocate(layout)
    }
}

/// Always grants. Memory comes from the global allocator.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Global;

impl Allocator for Global {
    #[inline]
    fn allocate(&self, _layout: Layout) -> Result<(), AllocError> {
        Ok(())
    }

    #[inline]
    fn deallocate(&self, _layout: Layout) {}
}

/// Accounting allocator: counts grants and live blocks, and can refuse
/// once a live-block limit is reached.
///
/// Share it with a map by reference or through an `Rc` so the counters can
/// be read while (and after) the map is alive.
#[derive(Debug, Default)]
pub struct TrackingAllocator {
    max_live_blocks: Option<usize>,
    grants: Cell<usize>,
    refusals: Cell<usize>,
    live_blocks: Cell<usize>,
    live_bytes: Cell<usize>,
    peak_bytes: Cell<usize>,
}

impl TrackingAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse any request that would exceed `max` simultaneously live blocks.
    pub fn with_block_limit(max: usize) -> Self {
        Self {
            max_live_blocks: Some(max),
            ..Self::default()
        }
    }

    /// Total number of granted requests.
    pub fn grants(&self) -> usize {
        self.grants.get()
    }

    pub fn refusals(&self) -> usize {
        self.refusals.get()
    }

    pub fn live_blocks(&self) -> usize {
        self.live_blocks.get()
    }

    pub fn live_bytes(&self) -> usize {
        self.live_bytes.get()
    }

    pub fn peak_bytes(&self) -> usize {
        self.peak_bytes.get()
    }
}

impl Allocator for TrackingAllocator {
    fn allocate(&self, layout: Layout) -> Result<(), AllocError> {
        let blocks = self.live_blocks.get();
        if self.max_live_blocks.is_some_and(|max| blocks >= max) {
            self.refusals.set(self.refusals.get() + 1);
            return Err(AllocError::for_layout(layout));
        }
        self.grants.set(self.grants.get() + 1);
        self.live_blocks.set(blocks + 1);
        let bytes = self.live_bytes.get() + layout.size();
        self.live_bytes.set(bytes);
        if bytes > self.peak_bytes.get() {
            self.peak_bytes.set(bytes);
        }
        Ok(())
    }

    fn deallocate(&self, layout: Layout) {
        let blocks = self.live_blocks.get();
        assert!(blocks > 0, "TrackingAllocator: release without a live grant");
        self.live_blocks.set(blocks - 1);
        self.live_bytes.set(self.live_bytes.get() - layout.size());
    }
}
