//! Content fingerprints (blake3) used to decide page freshness.

mod hash;

pub use hash::{ContentHash, hash_bytes, hash_file, hash_many};
