//! FNV-1 and FNV-1a byte hashes, 32 and 64 bit.
//!
//! Deterministic, seedless hashes suitable as the map's hashing strategy when
//! a stable bucket layout across runs is wanted. The `*_cstr` forms hash a
//! NUL-terminated string up to, and excluding, the terminator.
//!
//! Note that `Hash for str` appends a `0xff` byte before reaching the
//! hasher, so `BuildFnv1a32::hash_one("abc")` differs from `fnv1a_32(b"abc")`.

use core::ffi::CStr;
use core::hash::{BuildHasher, Hasher};

const OFFSET_32: u32 = 0x811c_9dc5;
const PRIME_32: u32 = 0x0100_0193;
const OFFSET_64: u64 = 0xcbf2_9ce4_8422_2325;
const PRIME_64: u64 = 0x0000_0100_0000_01b3;

#[inline]
fn step1a_32(hash: u32, bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .fold(hash, |h, &b| (h ^ u32::from(b)).wrapping_mul(PRIME_32))
}

#[inline]
fn step1a_64(hash: u64, bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(hash, |h, &b| (h ^ u64::from(b)).wrapping_mul(PRIME_64))
}

pub fn fnv1_32(data: &[u8]) -> u32 {
    data.iter()
        .fold(OFFSET_32, |h, &b| h.wrapping_mul(PRIME_32) ^ u32::from(b))
}

pub fn fnv1a_32(data: &[u8]) -> u32 {
    step1a_32(OFFSET_32, data)
}

pub fn fnv1_64(data: &[u8]) -> u64 {
    data.iter()
        .fold(OFFSET_64, |h, &b| h.wrapping_mul(PRIME_64) ^ u64::from(b))
}

pub fn fnv1a_64(data: &[u8]) -> u64 {
    step1a_64(OFFSET_64, data)
}

pub fn fnv1_32_cstr(s: &CStr) -> u32 {
    fnv1_32(s.to_bytes())
}

pub fn fnv1a_32_cstr(s: &CStr) -> u32 {
    fnv1a_32(s.to_bytes())
}

pub fn fnv1_64_cstr(s: &CStr) -> u64 {
    fnv1_64(s.to_bytes())
}

pub fn fnv1a_64_cstr(s: &CStr) -> u64 {
    fnv1a_64(s.to_bytes())
}

/// Streaming FNV-1a 32-bit hasher. `finish` zero-extends the 32-bit state.
#[derive(Debug, Clone, Copy)]
pub struct Fnv1a32Hasher(u32);

impl Default for Fnv1a32Hasher {
    fn default() -> Self {
        Self(OFFSET_32)
    }
}

impl Hasher for Fnv1a32Hasher {
    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        self.0 = step1a_32(self.0, bytes);
    }

    #[inline]
    fn finish(&self) -> u64 {
        u64::from(self.0)
    }
}

/// Streaming FNV-1a 64-bit hasher.
#[derive(Debug, Clone, Copy)]
pub struct Fnv1a64Hasher(u64);

impl Default for Fnv1a64Hasher {
    fn default() -> Self {
        Self(OFFSET_64)
    }
}

impl Hasher for Fnv1a64Hasher {
    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        self.0 = step1a_64(self.0, bytes);
    }

    #[inline]
    fn finish(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BuildFnv1a32;

impl BuildHasher for BuildFnv1a32 {
    type Hasher = Fnv1a32Hasher;
    fn build_hasher(&self) -> Self::Hasher {
        Fnv1a32Hasher::default()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BuildFnv1a64;

impl BuildHasher for BuildFnv1a64 {
    type Hasher = Fnv1a64Hasher;
    fn build_hasher(&self) -> Self::Hasher {
        Fnv1a64Hasher::default()
    }
}
