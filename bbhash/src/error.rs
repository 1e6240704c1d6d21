//! Error type surfaced by serialization.
//!
//! Duplicate keys, out-of-set lookups, and precondition violations are
//! either routed through [`crate::Diagnostics`] or are programmer errors
//! that panic in debug builds; they don't need an `Err` variant here.

use thiserror::Error;

/// Failure reading or writing a [`crate::Bbhash`].
#[derive(Error, Debug)]
pub enum BbhashError {
    /// The underlying stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A level's stored `size` field disagreed with the domain recomputed
    /// from `gamma`/`N` on load.
    #[error("corrupt level {level}: stored size {stored} does not match recomputed domain {recomputed}")]
    CorruptLevel { level: u32, stored: u64, recomputed: u64 },
}
