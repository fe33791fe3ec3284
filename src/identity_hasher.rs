//! A hasher which hands integer keys back as their own hash. Bucket placement
//! in a [`ShardTable`](crate::ShardTable) becomes `key % capacity`, which is
//! handy when you want to know exactly which bucket a key lands in.
//!
//! Anything that isn't a single integer gets its bytes folded together, which
//! is deterministic but a poor hash. Don't use this for strings.

use std::hash::{BuildHasher, Hasher};

/// Proxies integers for themselves.
#[derive(Default)]
pub struct IdentityHasher(u64);

impl IdentityHasher {
    // a fresh hasher is zero, so a single write comes out untouched
    fn mix(&mut self, i: u64) {
        self.0 = self.0.rotate_left(8) ^ i;
    }
}

impl Hasher for IdentityHasher {
    fn write(&mut self, bytes: &[u8]) {
        for byte in bytes.iter() {
            self.mix(*byte as u64);
        }
    }

    fn write_u8(&mut self, i: u8) {
        self.mix(i as u64);
    }

    fn write_u16(&mut self, i: u16) {
        self.mix(i as u64);
    }

    fn write_u32(&mut self, i: u32) {
        self.mix(i as u64);
    }

    fn write_u64(&mut self, i: u64) {
        self.mix(i);
    }

    fn write_usize(&mut self, i: usize) {
        self.mix(i as u64);
    }

    fn write_i8(&mut self, i: i8) {
        self.mix(i as u64);
    }

    fn write_i16(&mut self, i: i16) {
        self.mix(i as u64);
    }

    fn write_i32(&mut self, i: i32) {
        self.mix(i as u64);
    }

    fn write_i64(&mut self, i: i64) {
        self.mix(i as u64);
    }

    fn write_isize(&mut self, i: isize) {
        self.mix(i as u64);
    }

    fn finish(&self) -> u64 {
        self.0
    }
}

/// Builds new IdentityHashers on demand.
#[derive(Clone, Copy, Debug, Default)]
pub struct BuildIdentityHasher;

impl BuildHasher for BuildIdentityHasher {
    type Hasher = IdentityHasher;

    fn build_hasher(&self) -> Self::Hasher {
        IdentityHasher(0)
    }
}
