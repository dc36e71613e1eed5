//! Ed25519 signing: raw messages and wallet-style personal messages.

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use inscribe_types::{PrivateKey, PublicKey, Signature};
use sha3::{Digest, Keccak256};

/// Prefix wallets prepend before hashing an off-chain message.
const PERSONAL_MESSAGE_PREFIX: &str = "\x17Elrond Signed Message:\n";

/// Sign a message with a private key, returning the signature.
pub fn sign_message(message: &[u8], private_key: &PrivateKey) -> Signature {
    let signing_key = SigningKey::from_bytes(&private_key.0);
    Signature(signing_key.sign(message).to_bytes())
}

/// Verify a signature against a message and public key.
pub fn verify_signature(message: &[u8], signature: &Signature, public_key: &PublicKey) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_bytes(&public_key.0) else {
        return false;
    };
    let dalek_sig = ed25519_dalek::Signature::from_bytes(&signature.0);
    verifying_key.verify(message, &dalek_sig).is_ok()
}

/// Keccak-256 of the prefixed message: `prefix || len(message) || message`.
pub fn personal_message_digest(message: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(PERSONAL_MESSAGE_PREFIX.as_bytes());
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message);
    hasher.finalize().into()
}

/// Sign an off-chain message the way wallets do.
pub fn sign_personal_message(message: &[u8], private_key: &PrivateKey) -> Signature {
    sign_message(&personal_message_digest(message), private_key)
}

pub fn verify_personal_message(
    message: &[u8],
    signature: &Signature,
    public_key: &PublicKey,
) -> bool {
    verify_signature(&personal_message_digest(message), signature, public_key)
}
