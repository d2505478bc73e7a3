//! Disposal strategy: receives every key and value the map gives up.
//!
//! The map calls the disposer on overwrite, `remove`, guarded-iteration
//! removal, `clear` and drop, always after the entry has been unlinked.
//! `take` bypasses the disposer and returns ownership to the caller instead.

pub trait Disposer<K, V> {
    fn dispose_key(&self, key: K) {
        drop(key);
    }

    fn dispose_value(&self, value: V) {
        drop(value);
    }
}

impl<K, V, D: Disposer<K, V> + ?Sized> Disposer<K, V> for &D {
    #[inline]
    fn dispose_key(&self, key: K) {
        (**self).dispose_key(key)
    }

    #[inline]
    fn dispose_value(&self, value: V) {
        (**self).dispose_value(value)
    }
}

/// Drops keys and values in place.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DropDisposer;

impl<K, V> Disposer<K, V> for DropDisposer {}

/// Disposer built from a pair of closures, one for keys and one for values.
///
/// Pass `drop` for the side that needs no special handling:
/// `DisposeWith::new(|k: String| log_key(k), drop)`.
#[derive(Clone, Copy)]
pub struct DisposeWith<FK, FV> {
    key: FK,
    value: FV,
}

impl<FK, FV> DisposeWith<FK, FV> {
    pub fn new(key: FK, value: FV) -> Self {
        Self { key, value }
    }
}

impl<K, V, FK, FV> Disposer<K, V> for DisposeWith<FK, FV>
where
    FK: Fn(K),
    FV: Fn(V),
{
    #[inline]
    fn dispose_key(&self, key: K) {
        (self.key)(key)
    }

    #[inline]
    fn dispose_value(&self, value: V) {
        (self.value)(value)
    }
}

impl<FK, FV> core::fmt::Debug for DisposeWith<FK, FV> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("DisposeWith")
    }
}
