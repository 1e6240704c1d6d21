//! The public minimal perfect hash function: query engine and serialization
//! over the levels and final map a [`crate::builder::build`] run produces.

use std::collections::HashMap;
use std::io::{Read, Write};

use crate::builder::{self, CascadeResult, KeySource};
use crate::config::{CascadeConfig, NB_LEVELS};
use crate::diagnostics::Diagnostics;
use crate::error::BbhashError;
use crate::hash::{HashPair, LevelHashes, WyHashPair};
use crate::level::Level;
use crate::utils::{read_words, write_words};

/// Sentinel returned by [`Bbhash::lookup`] for keys outside the built set.
pub const NOT_FOUND: u64 = u64::MAX;

/// A minimal perfect hash function over a static set of `N` keys.
///
/// Created with [`Bbhash::new`] (or [`Bbhash::with_hasher`] for a custom
/// [`HashPair`]), then populated once with [`Bbhash::build`]. Queries are
/// read-only and safe to run concurrently from multiple threads.
pub struct Bbhash<H = WyHashPair> {
    gamma: f64,
    fast_load_fraction: f64,
    n: u64,
    hasher: H,
    levels: Vec<Level>,
    final_map: HashMap<(u64, u64), u64>,
    last_bitset_rank: u64,
}

impl Bbhash<WyHashPair> {
    /// Creates an unbuilt MPHF sized for `n` keys with the default hasher.
    /// Call [`Bbhash::build`] before looking anything up.
    pub fn new(n: u64, gamma: f64, fast_load_fraction: f64) -> Self {
        Self::with_hasher(n, gamma, fast_load_fraction, WyHashPair)
    }

    /// Like [`Bbhash::new`], but taking a [`BuildConf`] instead of loose
    /// `gamma`/`fast_load_fraction` arguments. `conf.num_threads` is not
    /// consulted here — pass it to [`Bbhash::build`] at build time.
    pub fn with_conf(n: u64, conf: crate::config::BuildConf) -> Self {
        Self::new(n, conf.gamma, conf.fast_load_fraction)
    }
}

impl<H> Bbhash<H> {
    /// Like [`Bbhash::new`], but with a caller-supplied [`HashPair`] implementation.
    pub fn with_hasher(n: u64, gamma: f64, fast_load_fraction: f64, hasher: H) -> Self {
        Self {
            gamma,
            fast_load_fraction,
            n,
            hasher,
            levels: Vec::new(),
            final_map: HashMap::new(),
            last_bitset_rank: 0,
        }
    }

    /// Consumes `range` to populate `self`. `range` must yield exactly `size()`
    /// items on every restart (see [`KeySource`]); the cascade re-iterates it
    /// once per level until fast mode engages.
    pub fn build<K, S, D>(&mut self, range: &S, num_threads: usize, diagnostics: &mut D)
    where
        S: KeySource<K> + Sync,
        H: HashPair<K> + Sync,
        K: Sync,
        D: Diagnostics + Send,
    {
        let CascadeResult { levels, final_map, last_bitset_rank } = builder::build(
            range,
            self.n,
            &self.hasher,
            self.gamma,
            self.fast_load_fraction,
            num_threads,
            diagnostics,
        );
        self.levels = levels;
        self.final_map = final_map;
        self.last_bitset_rank = last_bitset_rank;
    }

    /// Returns `key`'s index in `[0, size())`, or [`NOT_FOUND`] if `key` was
    /// not in the set `build` was run on (best-effort: an out-of-set key may
    /// also alias to a valid in-set index, as with any MPHF).
    pub fn lookup<K: ?Sized>(&self, key: &K) -> u64
    where
        H: HashPair<K>,
    {
        let (h0, h1) = self.hasher.hash_pair(key);
        let mut seq = LevelHashes::new(h0, h1);
        for level in &self.levels {
            let h = seq.next_hash();
            let slot = level.slot(h);
            if level.bits().get(slot) {
                return level.bits().rank(slot);
            }
        }
        match self.final_map.get(&(h0, h1)) {
            Some(&idx) => idx + self.last_bitset_rank,
            None => NOT_FOUND,
        }
    }

    /// Number of keys in the set this MPHF was built for.
    #[inline]
    pub fn size(&self) -> u64 {
        self.n
    }

    /// The `domain_i` bit-array size of every cascade level, in level order.
    ///
    /// Empty until [`Bbhash::build`] (or [`Bbhash::load`]) has populated
    /// `self.levels`.
    pub fn level_domains(&self) -> Vec<u64> {
        self.levels.iter().map(Level::domain).collect()
    }

    /// Approximate heap footprint in bytes.
    ///
    /// The final map's contribution uses a hard-coded 42-bytes-per-entry
    /// estimate, accounting for `HashMap`'s bucket overhead — a rough figure,
    /// not a measured one.
    pub fn mem_size(&self) -> usize {
        dyn_size_of::GetSize::size_bytes(self)
    }

    /// Writes the on-disk byte-stream format: header, then each level's
    /// payload in order, then the final map.
    pub fn save<W: Write + ?Sized>(&self, output: &mut W) -> Result<(), BbhashError> {
        write_words(output, &[self.gamma.to_bits()])?;
        output.write_all(&(NB_LEVELS as i32).to_le_bytes())?;
        write_words(output, &[self.last_bitset_rank, self.n])?;
        for level in &self.levels {
            level.write_payload(output)?;
        }
        write_words(output, &[self.final_map.len() as u64])?;
        for (&(h0, h1), &idx) in &self.final_map {
            write_words(output, &[h0, h1, idx])?;
        }
        Ok(())
    }
}

impl<H: Default> Bbhash<H> {
    /// Reads back what [`Bbhash::save`] wrote.
    ///
    /// Each level's domain is cross-checked against the value recomputed from
    /// `gamma`/`N`: the on-disk format stores it directly, but trusting the
    /// stored value alone would mask silent corruption, so this validates
    /// both agree instead.
    pub fn load<R: Read + ?Sized>(input: &mut R) -> Result<Self, BbhashError> {
        let gamma = f64::from_bits(read_words(input, 1)?[0]);
        let mut nb_levels_buf = [0u8; 4];
        input.read_exact(&mut nb_levels_buf)?;
        let nb_levels = i32::from_le_bytes(nb_levels_buf);

        let header = read_words(input, 2)?;
        let (last_bitset_rank, n) = (header[0], header[1]);

        let n_bit_levels = (nb_levels - 1).max(0) as usize;
        let sizing = CascadeConfig::new(n, gamma, 0.0);
        let mut levels = Vec::with_capacity(n_bit_levels);
        for level_idx in 0..n_bit_levels {
            let level = Level::read_payload(input)?;
            let expected = sizing.domain(level_idx as u32);
            if level.domain() != expected {
                return Err(BbhashError::CorruptLevel {
                    level: level_idx as u32,
                    stored: level.domain(),
                    recomputed: expected,
                });
            }
            levels.push(level);
        }

        let final_map_size = read_words(input, 1)?[0] as usize;
        let mut final_map = HashMap::with_capacity(final_map_size);
        for _ in 0..final_map_size {
            let entry = read_words(input, 3)?;
            final_map.insert((entry[0], entry[1]), entry[2]);
        }

        Ok(Self {
            gamma,
            fast_load_fraction: 0.0,
            n,
            hasher: H::default(),
            levels,
            final_map,
            last_bitset_rank,
        })
    }
}

impl<H> dyn_size_of::GetSize for Bbhash<H> {
    fn size_bytes_dyn(&self) -> usize {
        let levels_size: usize = self.levels.iter().map(Level::mem_size).sum();
        levels_size + self.final_map.len() * 42
    }

    const USES_DYN_MEM: bool = true;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbuilt_mphf_always_misses() {
        let m = Bbhash::new(0, 2.0, 0.03);
        assert_eq!(m.lookup(&42u64), NOT_FOUND);
        assert_eq!(m.size(), 0);
    }

    #[test]
    fn build_then_lookup_is_a_bijection_for_small_ints() {
        let keys: Vec<u64> = (0..64).collect();
        let mut m = Bbhash::new(keys.len() as u64, 2.0, 0.03);
        m.build(&keys, 1, &mut ());

        let mut seen = vec![false; keys.len()];
        for &k in &keys {
            let idx = m.lookup(&k);
            assert_ne!(idx, NOT_FOUND);
            assert!((idx as usize) < keys.len());
            assert!(!seen[idx as usize], "index {idx} assigned twice");
            seen[idx as usize] = true;
        }
        assert!(seen.into_iter().all(|b| b));
    }

    #[test]
    fn save_load_roundtrip_preserves_lookups() {
        let keys: Vec<u64> = (0..200).collect();
        let mut m = Bbhash::new(keys.len() as u64, 2.0, 0.03);
        m.build(&keys, 2, &mut ());

        let mut buf = Vec::new();
        m.save(&mut buf).unwrap();
        let loaded = Bbhash::<WyHashPair>::load(&mut &buf[..]).unwrap();

        for &k in &keys {
            assert_eq!(m.lookup(&k), loaded.lookup(&k));
        }
    }

    #[test]
    fn empty_set_roundtrips() {
        let m: Bbhash = Bbhash::new(0, 2.0, 0.03);
        let mut buf = Vec::new();
        m.save(&mut buf).unwrap();
        let loaded = Bbhash::<WyHashPair>::load(&mut &buf[..]).unwrap();
        assert_eq!(loaded.size(), 0);
        assert_eq!(loaded.lookup(&1u64), NOT_FOUND);
    }

    #[test]
    fn with_conf_matches_new() {
        let conf = crate::config::BuildConf { gamma: 1.5, fast_load_fraction: 0.03, num_threads: 1 };
        let mut m = Bbhash::with_conf(10, conf);
        m.build(&(0..10u64).collect::<Vec<_>>(), 1, &mut ());
        assert_eq!(m.size(), 10);
    }

    #[test]
    fn level_domains_are_64_aligned_and_shrink() {
        let keys: Vec<u64> = (0..1000).collect();
        let mut m = Bbhash::new(keys.len() as u64, 2.0, 0.03);
        m.build(&keys, 1, &mut ());

        let domains = m.level_domains();
        assert!(!domains.is_empty());
        assert!(domains.iter().all(|d| d % 64 == 0 && *d > 0));
        assert!(domains[0] >= *domains.last().unwrap());
    }

    #[test]
    fn duplicate_keys_do_not_panic() {
        let keys = vec![1u64, 1, 2, 3];
        let mut m = Bbhash::new(keys.len() as u64, 2.0, 0.03);
        m.build(&keys, 1, &mut ());
        for k in [1u64, 2, 3] {
            assert!(m.lookup(&k) < keys.len() as u64);
        }
    }

    #[test]
    fn gamma_one_still_yields_a_bijection() {
        let keys: Vec<u64> = (0..1000).collect();
        let mut m = Bbhash::new(keys.len() as u64, 1.0, 0.03);
        m.build(&keys, 2, &mut ());

        let mut seen = vec![false; keys.len()];
        for &k in &keys {
            let idx = m.lookup(&k);
            assert!((idx as usize) < keys.len());
            assert!(!seen[idx as usize]);
            seen[idx as usize] = true;
        }
    }
}
