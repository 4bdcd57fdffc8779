//! Deterministic hashers for tests that depend on slot placement.

use std::hash::{BuildHasherDefault, Hasher};

/// Hashes integers to themselves so slot placement is predictable.
#[derive(Default)]
pub(crate) struct IdentityHasher(u64);

impl Hasher for IdentityHasher {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 = (self.0 << 8) | b as u64;
        }
    }

    fn write_u64(&mut self, i: u64) {
        self.0 = i;
    }

    fn write_i32(&mut self, i: i32) {
        self.0 = i as u64;
    }

    fn write_u32(&mut self, i: u32) {
        self.0 = i as u64;
    }
}

pub(crate) type Identity = BuildHasherDefault<IdentityHasher>;

/// Every key hashes to zero.
#[derive(Default)]
pub(crate) struct ZeroHasher;

impl Hasher for ZeroHasher {
    fn finish(&self) -> u64 {
        0
    }

    fn write(&mut self, _bytes: &[u8]) {}
}

pub(crate) type Colliding = BuildHasherDefault<ZeroHasher>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::hash::BuildHasher;

    #[test]
    fn test_identity_hashes_integers_to_themselves() {
        let build = Identity::default();
        assert_eq!(build.hash_one(42u64), 42);
        assert_eq!(build.hash_one(7u32), 7);
        assert_eq!(build.hash_one(-1i32), u64::MAX);
    }

    #[test]
    fn test_colliding_hashes_everything_to_zero() {
        let build = Colliding::default();
        assert_eq!(build.hash_one(42u64), 0);
        assert_eq!(build.hash_one("key"), 0);
    }
}
