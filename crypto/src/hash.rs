//! Blake2b hashing for locally computed content hashes.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use inscribe_types::ContentHash;

type Blake2b256 = Blake2b<U32>;

/// Compute a 256-bit Blake2b hash of arbitrary data.
pub fn blake2b_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Content hash of an encoded payload: lowercase hex Blake2b-256.
pub fn content_hash(encoded_payload: &str) -> ContentHash {
    let digest = hex::encode(blake2b_256(encoded_payload.as_bytes()));
    ContentHash::parse(&digest).expect("hex digest is a valid content hash")
}
