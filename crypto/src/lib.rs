//! Cryptographic primitives for inscriptions.
//!
//! - **Base64** payload codec (reversible, UTF-8 safe)
//! - **Blake2b-256** content hashing for locally computed inscription hashes
//! - **Ed25519** key pairs, message and transaction signing
//! - **Keccak-256** personal-message digests, the form wallets sign
//! - PEM wallet files

pub mod codec;
pub mod error;
pub mod hash;
pub mod keys;
pub mod pem;
pub mod sign;

pub use codec::{decode_payload, encode_payload};
pub use error::CryptoError;
pub use hash::{blake2b_256, content_hash};
pub use keys::{generate_keypair, keypair_from_seed, public_from_private};
pub use pem::{encode_pem, parse_pem};
pub use sign::{
    personal_message_digest, sign_message, sign_personal_message, verify_personal_message,
    verify_signature,
};
