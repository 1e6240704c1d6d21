#![doc = include_str!("../README.md")]

pub mod bitvector;
pub mod builder;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod hash;
pub mod level;
mod mphf;
pub mod utils;

pub use builder::KeySource;
pub use config::BuildConf;
pub use diagnostics::Diagnostics;
pub use error::BbhashError;
pub use hash::{HashPair, WyHashPair};
pub use mphf::{Bbhash, NOT_FOUND};

pub use dyn_size_of::GetSize;
