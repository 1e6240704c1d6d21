//! The cascade builder: orchestrates the `nb_levels` parallel construction
//! passes (level-by-level retain loop, atomic test-and-set into a shared
//! bit array, single-thread collision sweep after the parallel phase),
//! built around an explicit bit-level cascade with xorshift-derived
//! per-level hashes instead of independent reseeded hashes per level.

use std::cell::UnsafeCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use crate::config::{CascadeConfig, DRAIN_BUFFER, NB_LEVELS};
use crate::diagnostics::Diagnostics;
use crate::hash::{HashPair, LevelHashes};
use crate::level::Level;

/// A restartable source of keys.
///
/// The cascade re-iterates the input at every level until fast mode engages;
/// the iterator itself need not be thread-safe, only cheap to restart.
/// `fresh_iter` hands back borrowed keys — [`HashPair::hash_pair`] only ever
/// needs `&K`, so restarting never requires cloning the underlying collection.
pub trait KeySource<K> {
    fn fresh_iter(&self) -> Box<dyn Iterator<Item = &K> + Send + '_>;
}

impl<T, K> KeySource<K> for T
where
    for<'t> &'t T: IntoIterator<Item = &'t K>,
    for<'t> <&'t T as IntoIterator>::IntoIter: Send,
{
    fn fresh_iter(&self) -> Box<dyn Iterator<Item = &K> + Send + '_> {
        Box::new(self.into_iter())
    }
}

/// The shared, mutex-guarded cursor workers drain from. Unifies the "basic"
/// (rehash each key) and "fast" (replay buffered hash pairs) input modes
/// behind one interface: both always hand back `(h0, h1)` pairs.
enum Source<'a, K> {
    Keys(Mutex<Box<dyn Iterator<Item = &'a K> + Send + 'a>>),
    Hashes(Mutex<std::slice::Iter<'a, (u64, u64)>>),
}

impl<'a, K> Source<'a, K> {
    /// Drains up to `DRAIN_BUFFER` items into `out` (cleared first), computing
    /// the hash pair for basic-mode keys. Returns `true` once the underlying
    /// iterator is exhausted (the batch just drained may still be non-empty).
    fn drain_batch(&self, hasher: &impl HashPair<K>, out: &mut Vec<(u64, u64)>) -> bool {
        out.clear();
        match self {
            Source::Keys(it) => {
                let mut guard = it.lock().unwrap();
                for _ in 0..DRAIN_BUFFER {
                    match guard.next() {
                        Some(k) => out.push(hasher.hash_pair(k)),
                        None => return true,
                    }
                }
                false
            }
            Source::Hashes(it) => {
                let mut guard = it.lock().unwrap();
                for _ in 0..DRAIN_BUFFER {
                    match guard.next() {
                        Some(&pair) => out.push(pair),
                        None => return true,
                    }
                }
                false
            }
        }
    }
}

/// Preallocated buffer of materialized hash pairs used once a level's
/// survivor population is small enough that rehashing from keys is wasteful.
///
/// Slots are claimed with an atomic fetch-add, then written through an
/// `UnsafeCell`; this is sound because each index is handed out to exactly
/// one thread, mirroring [`crate::bitvector::BitVector`]'s atomic word access.
struct FastModeBuffer {
    slots: Box<[UnsafeCell<(u64, u64)>]>,
    len: AtomicU64,
    capacity: u64,
    enabled: AtomicBool,
}

unsafe impl Sync for FastModeBuffer {}

impl FastModeBuffer {
    fn new(capacity: u64) -> Self {
        let slots = (0..capacity).map(|_| UnsafeCell::new((0u64, 0u64))).collect();
        Self { slots, len: AtomicU64::new(0), capacity, enabled: AtomicBool::new(capacity > 0) }
    }

    fn try_push(&self, v: (u64, u64), level: u32, diag: &Mutex<&mut (dyn Diagnostics + Send)>) {
        if !self.enabled.load(Ordering::Relaxed) {
            return;
        }
        let idx = self.len.fetch_add(1, Ordering::Relaxed);
        if idx >= self.capacity {
            if self.enabled.swap(false, Ordering::Relaxed) {
                diag.lock().unwrap().fast_mode_disabled(level);
            }
            return;
        }
        unsafe { *self.slots[idx as usize].get() = v };
    }

    fn as_slice(&self) -> &[(u64, u64)] {
        let n = (self.len.load(Ordering::Relaxed)).min(self.capacity) as usize;
        unsafe { std::slice::from_raw_parts(self.slots.as_ptr().cast::<(u64, u64)>(), n) }
    }
}

/// Walks `v`'s hash sequence past every already-built `levels`, returning the
/// sequence positioned right after them (so the next `next_hash()` is the hash
/// for the level under construction), or `None` if some earlier level already
/// claimed `v`.
fn skip_claimed(v: (u64, u64), levels: &[Level]) -> Option<LevelHashes> {
    let mut seq = LevelHashes::new(v.0, v.1);
    for level in levels {
        let h = seq.next_hash();
        if level.is_set(h) {
            return None;
        }
    }
    Some(seq)
}

/// Result of a completed cascade build.
pub struct CascadeResult {
    pub levels: Vec<Level>,
    pub final_map: HashMap<(u64, u64), u64>,
    pub last_bitset_rank: u64,
}

/// Runs the full `nb_levels`-pass cascade described in the module overview.
///
/// `n` is the number of keys `source` yields (used to size `domain_i` and the
/// fast-mode buffer); it is the caller's responsibility to ensure `source`
/// actually yields exactly `n` items on every restart.
pub fn build<K, S, H>(
    source: &S,
    n: u64,
    hasher: &H,
    gamma: f64,
    fast_load_fraction: f64,
    num_threads: usize,
    diagnostics: &mut (dyn Diagnostics + Send),
) -> CascadeResult
where
    K: Sync,
    S: KeySource<K> + Sync,
    H: HashPair<K> + Sync,
{
    let cfg = CascadeConfig::new(n, gamma, fast_load_fraction);
    let n_bit_levels = (NB_LEVELS - 1) as usize;
    let mut levels: Vec<Level> = (0..n_bit_levels as u32).map(|i| Level::new(cfg.domain(i))).collect();

    let fast_capacity = (fast_load_fraction * n as f64).ceil().max(0.0) as u64;
    let fastmode_buffer = FastModeBuffer::new(fast_capacity);
    let fast_mode_level = cfg.fast_mode_level();

    let final_map: Mutex<HashMap<(u64, u64), u64>> = Mutex::new(HashMap::new());
    let final_counter = AtomicU64::new(0);
    let diag = Mutex::new(diagnostics);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads.max(1))
        .build()
        .expect("failed to create the cascade build thread pool");

    let mut offset = 0u64;
    // Survivors entering the level about to run; level 0 sees every key.
    // Each level recounts how many items actually reach it (pass `skip_claimed`)
    // and that becomes the snapshot logged for the next level.
    let survivors = AtomicU64::new(n);

    for i in 0..NB_LEVELS {
        let input_size = survivors.load(Ordering::Relaxed);
        diag.lock().unwrap().level(i, input_size, levels.get(i as usize).map_or(0, |l| l.domain()));
        let level_survivors = AtomicU64::new(0);

        let is_final = i == NB_LEVELS - 1;
        let collision = if is_final { None } else { Some(Level::new(levels[i as usize].domain())) };

        let use_fastmode_source = fast_mode_level < NB_LEVELS && i > fast_mode_level;
        let source_wrapper: Source<'_, K> = if use_fastmode_source {
            Source::Hashes(Mutex::new(fastmode_buffer.as_slice().iter()))
        } else {
            Source::Keys(Mutex::new(source.fresh_iter()))
        };

        let built_levels: &[Level] = &levels[..i.min(n_bit_levels as u32) as usize];

        pool.scope(|s| {
            for _ in 0..num_threads.max(1) {
                let source_wrapper = &source_wrapper;
                let hasher = &hasher;
                let built_levels = built_levels;
                let current_level = if is_final { None } else { Some(&levels[i as usize]) };
                let current_collision = collision.as_ref();
                let fastmode_buffer = &fastmode_buffer;
                let final_map = &final_map;
                let final_counter = &final_counter;
                let diag = &diag;
                let level_survivors = &level_survivors;

                s.spawn(move |_| {
                    let mut local = Vec::with_capacity(DRAIN_BUFFER);
                    loop {
                        let done = source_wrapper.drain_batch(*hasher, &mut local);
                        for &v in &local {
                            let Some(mut seq) = skip_claimed(v, built_levels) else { continue };
                            level_survivors.fetch_add(1, Ordering::Relaxed);

                            if i == fast_mode_level {
                                fastmode_buffer.try_push(v, i, diag);
                            }

                            if let (Some(level), Some(collision)) = (current_level, current_collision) {
                                let h_i = seq.next_hash();
                                let slot = level.slot(h_i);
                                if level.bits().atomic_test_and_set(slot) {
                                    collision.bits().atomic_test_and_set(slot);
                                }
                            } else {
                                let index = final_counter.fetch_add(1, Ordering::Relaxed);
                                let mut map = final_map.lock().unwrap();
                                if map.insert(v, index).is_some() {
                                    diag.lock().unwrap().duplicate_key();
                                }
                            }
                        }
                        if done {
                            break;
                        }
                    }
                });
            }
        });

        survivors.store(level_survivors.load(Ordering::Relaxed), Ordering::Relaxed);

        if !is_final {
            let mut collision = collision.unwrap();
            let domain = levels[i as usize].domain();
            {
                let (level_bits, collision_bits) = (levels[i as usize].bits_mut(), collision.bits_mut());
                level_bits.clear_collisions(0, domain, collision_bits);
            }
            offset = levels[i as usize].build_ranks(offset);
        }
    }

    diag.lock().unwrap().build_end(final_map.lock().unwrap().len() as u64);

    CascadeResult { levels, final_map: final_map.into_inner().unwrap(), last_bitset_rank: offset }
}
