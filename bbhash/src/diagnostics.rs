//! Build-time diagnostics channel: a zero-cost no-op implementation for the
//! hot path, with an opt-in `Stdout` implementation for development and
//! benchmarking.

/// Receives notifications during [`crate::Bbhash`] construction.
///
/// The default `()` implementation does nothing and compiles away entirely.
/// Implement this to log progress, collect level statistics, or surface
/// duplicate-key warnings: duplicates are not an `Err`, they are reported
/// here and the build continues.
pub trait Diagnostics {
    /// Called once per level, before that level's workers start.
    fn level(&mut self, _level: u32, _input_size: u64, _domain: u64) {}

    /// Called when a key collides with an existing entry in the final map —
    /// either a duplicate input key or an astronomically rare full hash collision.
    fn duplicate_key(&mut self) {}

    /// Called when the fast-mode buffer overflows and fast mode is disabled
    /// for the remainder of the build.
    fn fast_mode_disabled(&mut self, _level: u32) {}

    /// Called once, after the last level, with the final population of the map `F`.
    fn build_end(&mut self, _final_map_size: u64) {}
}

impl Diagnostics for () {}

/// Writes every notification to stdout. Intended for interactive development.
#[derive(Default)]
pub struct Stdout;

impl Diagnostics for Stdout {
    fn level(&mut self, level: u32, input_size: u64, domain: u64) {
        println!("level {level}: {input_size} survivors, domain {domain}");
    }

    fn duplicate_key(&mut self) {
        println!("warning: duplicate key (or hash collision) detected during build");
    }

    fn fast_mode_disabled(&mut self, level: u32) {
        println!("fast mode buffer exhausted at level {level}, falling back to rehashing");
    }

    fn build_end(&mut self, final_map_size: u64) {
        println!("build finished, final map holds {final_map_size} entries");
    }
}
