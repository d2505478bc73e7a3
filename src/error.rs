//! Error types for map construction and insertion.

use core::fmt;
use thiserror::Error;

/// The allocator refused a request for `size` bytes aligned to `align`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("allocator refused {size} bytes (align {align})")]
pub struct AllocError {
    pub size: usize,
    pub align: usize,
}

impl AllocError {
    pub fn for_layout(layout: core::alloc::Layout) -> Self {
        Self {
            size: layout.size(),
            align: layout.align(),
        }
    }
}

/// Reasons a map could not be constructed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateError {
    /// A map needs at least one bucket.
    #[error("bucket count must be greater than zero")]
    ZeroBuckets,

    /// The bucket array layout does not fit in the address space.
    #[error("bucket array of {0} slots overflows the address space")]
    CapacityOverflow(usize),

    /// The allocator refused the map record or the bucket array.
    #[error("failed to allocate map storage: {0}")]
    Alloc(#[from] AllocError),
}

/// `set` could not allocate a new entry.
///
/// The map is left untouched and ownership of the rejected key and value
/// goes back to the caller.
#[derive(Error)]
#[error("failed to allocate entry: {source}")]
pub struct SetError<K, V> {
    key: K,
    value: V,
    source: AllocError,
}

impl<K, V> SetError<K, V> {
    pub(crate) fn new(key: K, value: V, source: AllocError) -> Self {
        Self { key, value, source }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn alloc_error(&self) -> AllocError {
        self.source
    }

    /// Recover the key and value that were not inserted.
    pub fn into_parts(self) -> (K, V) {
        (self.key, self.value)
    }
}

// Keys and values are opaque to the map; don't require them to be Debug.
impl<K, V> fmt::Debug for SetError<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetError")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::alloc::Layout;
    use std::error::Error as _;

    #[test]
    fn create_error_wraps_alloc_error() {
        let e: CreateError = AllocError::for_layout(Layout::from_size_align(8, 8).unwrap()).into();
        assert_eq!(e, CreateError::Alloc(AllocError { size: 8, align: 8 }));
        assert_eq!(
            e.to_string(),
            "failed to allocate map storage: allocator refused 8 bytes (align 8)"
        );
    }

    /// Invariant: `SetError` hands back key and value and exposes the
    /// allocator refusal as its source, without requiring `K: Debug`.
    #[test]
    fn set_error_returns_parts_and_source() {
        struct Opaque(u8);
        let src = AllocError { size: 32, align: 8 };
        let err = SetError::new(Opaque(1), Opaque(2), src);
        assert_eq!(err.alloc_error(), src);
        assert!(err.source().is_some());
        assert!(format!("{:?}", err).starts_with("SetError"));
        let (k, v) = err.into_parts();
        assert_eq!((k.0, v.0), (1, 2));
    }
}
