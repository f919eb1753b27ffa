//! This module provides a `HashMap` that uses a deterministic hasher. The hashing data
//! structures in the standard library are not deterministic:
//!
//! > By default, HashMap uses a hashing algorithm selected to provide
//! > resistance against HashDoS attacks. The algorithm is randomly seeded, and a
//! > reasonable best-effort is made to generate this seed from a high quality,
//! > secure source of randomness provided by the host without blocking the program.
//!
//! Use `HashMap::default()` to create a new map with the deterministic hasher.
//!
//! The `hash_str` free function derives the seed offset of each random stream in
//! `crate::random`, so it must give the same value on every platform and every run.

use xxhash_rust::xxh3::xxh3_64;

pub use rustc_hash::FxHashMap as HashMap;

/// A convenience method to compute the hash of a `&str`.
pub fn hash_str(data: &str) -> u64 {
    xxh3_64(data.as_bytes())
}
