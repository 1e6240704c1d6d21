//! Cascade configuration: level count, per-level domain sizes, and the
//! level at which the builder switches to fast mode.

use crate::utils::round_up_64;

/// Number of cascade levels. Fixed (not exposed at the public API), matching
/// the historical BBHash source this algorithm is ported from.
pub const NB_LEVELS: u32 = 25;

/// Number of items a worker drains from the shared input cursor per lock acquisition.
pub const DRAIN_BUFFER: usize = 10_000;

/// User-facing build knobs: space/build tradeoff, the fast-mode threshold,
/// and parallelism.
#[derive(Clone, Copy, Debug)]
pub struct BuildConf {
    /// Space/build tradeoff. Must be >= 1.0; 2.0 is typical.
    pub gamma: f64,
    /// Fraction of `N` below which the builder switches to replaying a
    /// materialized hash-pair buffer instead of rehashing keys. `0.0` disables
    /// fast mode entirely.
    pub fast_load_fraction: f64,
    /// Number of parallel workers used during `build`.
    pub num_threads: usize,
}

impl Default for BuildConf {
    fn default() -> Self {
        Self { gamma: 2.0, fast_load_fraction: 0.03, num_threads: rayon::current_num_threads() }
    }
}

/// Precomputed, immutable parameters for one cascade build.
#[derive(Clone, Copy, Debug)]
pub struct CascadeConfig {
    pub gamma: f64,
    pub n: u64,
    p_collide: f64,
    hash_domain: u64,
    fast_mode_level: u32,
}

impl CascadeConfig {
    /// Derives the per-level cascade parameters for `n` keys.
    pub fn new(n: u64, gamma: f64, fast_load_fraction: f64) -> Self {
        debug_assert!(gamma >= 1.0, "gamma must be >= 1.0");
        if n == 0 {
            return Self { gamma, n, p_collide: 0.0, hash_domain: 64, fast_mode_level: NB_LEVELS };
        }
        let gamma_n = gamma * n as f64;
        let p_collide = if n == 1 {
            0.0
        } else {
            1.0 - ((gamma_n - 1.0) / gamma_n).powf((n - 1) as f64)
        };
        let hash_domain = gamma_n.ceil() as u64;

        let fast_mode_level = if fast_load_fraction <= 0.0 {
            NB_LEVELS
        } else {
            let mut level = 0u32;
            let mut power = 1.0f64; // p_collide^level
            while level < NB_LEVELS && !(power < fast_load_fraction) {
                power *= p_collide;
                level += 1;
            }
            level
        };

        Self { gamma, n, p_collide, hash_domain, fast_mode_level }
    }

    /// `domain_i`: the (64-aligned, >= 64) bit-array size of level `level`.
    #[inline]
    pub fn domain(&self, level: u32) -> u64 {
        if self.n == 0 {
            return 64;
        }
        let raw = (self.hash_domain as f64 * self.p_collide.powi(level as i32)) as u64;
        round_up_64(raw).max(64)
    }

    /// Smallest level at which the builder switches from rehashing the
    /// original key range to iterating the materialized hash-pair buffer
    /// (`nb_levels` if fast mode is disabled for this build).
    #[inline]
    pub fn fast_mode_level(&self) -> u32 {
        self.fast_mode_level
    }

    #[inline]
    pub fn p_collide(&self) -> f64 {
        self.p_collide
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domains_are_64_aligned_and_positive() {
        let cfg = CascadeConfig::new(1_000, 2.0, 0.03);
        for level in 0..NB_LEVELS {
            let d = cfg.domain(level);
            assert!(d > 0);
            assert_eq!(d % 64, 0);
        }
    }

    #[test]
    fn domains_shrink_geometrically() {
        let cfg = CascadeConfig::new(1_000_000, 2.0, 0.03);
        assert!(cfg.domain(0) > cfg.domain(5));
        assert!(cfg.domain(5) > cfg.domain(10));
    }

    #[test]
    fn empty_set_has_trivial_domains() {
        let cfg = CascadeConfig::new(0, 2.0, 0.03);
        assert_eq!(cfg.domain(0), 64);
        assert_eq!(cfg.fast_mode_level(), NB_LEVELS);
    }

    #[test]
    fn fast_mode_level_is_disabled_when_fraction_is_zero() {
        let cfg = CascadeConfig::new(1_000, 2.0, 0.0);
        assert_eq!(cfg.fast_mode_level(), NB_LEVELS);
    }

    #[test]
    fn fast_mode_level_engages_before_last_level_for_large_n() {
        let cfg = CascadeConfig::new(100_000, 2.0, 0.03);
        assert!(cfg.fast_mode_level() < NB_LEVELS);
    }
}
