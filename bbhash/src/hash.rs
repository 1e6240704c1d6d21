//! The hash functor contract and the xorshift128-derived per-level hash sequence.

use std::hash::Hash;
use seedable_hash::BuildSeededHasher;

/// External collaborator supplying the 128-bit hash of a key, as two 64-bit halves.
///
/// Implementations must be deterministic and thread-safe, and must not mutate
/// the key. Collisions on the full 128 bits are assumed astronomically rare
/// and are treated by the builder as duplicate-input errors.
pub trait HashPair<K: ?Sized> {
    fn hash_pair(&self, key: &K) -> (u64, u64);
}

/// Default [`HashPair`] for any [`Hash`] key, built on `seedable_hash`'s wyhash family.
///
/// The two halves are produced by hashing the key twice with different seeds;
/// this is adequate for the cascade's purposes since each level only needs a
/// well-distributed 64-bit value, not a cryptographically independent pair.
#[derive(Default, Clone, Copy)]
pub struct WyHashPair;

impl<K: Hash + ?Sized> HashPair<K> for WyHashPair {
    #[inline]
    fn hash_pair(&self, key: &K) -> (u64, u64) {
        let h0 = seedable_hash::BuildWyHash.hash_one(key, 0);
        let h1 = seedable_hash::BuildWyHash.hash_one(key, 1);
        (h0, h1)
    }
}

/// The rolling `(s0, s1)` state used to derive hashes for levels `i >= 2` from `(h0, h1)`.
///
/// Levels `0` and `1` use `h0`/`h1` directly; from level `2` onward each
/// successive hash is produced by one step of the xorshift128+ generator
/// seeded with `(h0, h1)`. Hashes must be requested in increasing level
/// order, matching how both the builder and the query engine walk levels.
pub struct LevelHashes {
    h0: u64,
    h1: u64,
    state: (u64, u64),
    level: u32,
}

impl LevelHashes {
    #[inline]
    pub fn new(h0: u64, h1: u64) -> Self {
        Self { h0, h1, state: (h0, h1), level: 0 }
    }

    /// Returns the hash for the current level and advances to the next one.
    #[inline]
    pub fn next_hash(&mut self) -> u64 {
        let level = self.level;
        self.level += 1;
        match level {
            0 => self.h0,
            1 => self.h1,
            _ => xorshift128_step(&mut self.state),
        }
    }

    /// The `(h0, h1)` pair this sequence was seeded with (the full 128-bit key hash).
    #[inline]
    pub fn full_pair(&self) -> (u64, u64) {
        (self.h0, self.h1)
    }
}

/// One step of the xorshift128+ generator over `state = (lo, hi)`.
#[inline]
fn xorshift128_step(state: &mut (u64, u64)) -> u64 {
    let mut s1 = state.0;
    let s0 = state.1;
    state.0 = s0;
    s1 ^= s1 << 23;
    state.1 = s1 ^ s0 ^ (s1 >> 17) ^ (s0 >> 26);
    state.1.wrapping_add(s0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_0_and_1_return_the_halves() {
        let mut seq = LevelHashes::new(11, 22);
        assert_eq!(seq.next_hash(), 11);
        assert_eq!(seq.next_hash(), 22);
    }

    #[test]
    fn sequence_is_deterministic() {
        let mut a = LevelHashes::new(0x1234, 0x5678);
        let mut b = LevelHashes::new(0x1234, 0x5678);
        for _ in 0..10 {
            assert_eq!(a.next_hash(), b.next_hash());
        }
    }

    #[test]
    fn later_levels_diverge_from_the_seed_pair() {
        let mut seq = LevelHashes::new(1, 1);
        let _ = seq.next_hash();
        let _ = seq.next_hash();
        let h2 = seq.next_hash();
        let h3 = seq.next_hash();
        assert_ne!(h2, h3);
    }

    #[test]
    fn wyhash_pair_is_deterministic_and_distinct() {
        let hasher = WyHashPair;
        let (a0, a1) = hasher.hash_pair(&"hello");
        let (b0, b1) = hasher.hash_pair(&"hello");
        assert_eq!((a0, a1), (b0, b1));
        assert_ne!(a0, a1);
    }
}
