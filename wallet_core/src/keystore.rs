//! Password-protected keystore for the account seed.
//!
//! The seed is sealed with AES-256-GCM under a key stretched from the
//! password by Argon2id. The JSON file records the account address in the
//! clear so the CLI can show which account it holds before unlocking.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use argon2::{Algorithm, Argon2, Params, Version};
use inscribe_crypto::keypair_from_seed;
use inscribe_types::{Address, KeyPair};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::WalletError;

pub const KEYSTORE_VERSION: u32 = 1;

const ARGON2_MEMORY_KIB: u32 = 64 * 1024;
const ARGON2_ITERATIONS: u32 = 3;
const ARGON2_PARALLELISM: u32 = 1;

const SALT_LEN: usize = 32;
const NONCE_LEN: usize = 12;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KeystoreFile {
    pub version: u32,
    pub address: Address,
    pub crypto: SealedSeed,
}

/// Cipher text plus everything needed to re-derive the key. Hex fields.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SealedSeed {
    pub cipher: String,
    pub kdf: String,
    pub kdf_params: KdfParams,
    pub salt: String,
    pub nonce: String,
    pub ciphertext: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    pub memory: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory: ARGON2_MEMORY_KIB,
            iterations: ARGON2_ITERATIONS,
            parallelism: ARGON2_PARALLELISM,
        }
    }
}

/// Seal `seed` for `address` under `password`.
pub fn encrypt_keystore(
    address: &Address,
    seed: &[u8; 32],
    password: &str,
) -> Result<KeystoreFile, WalletError> {
    let mut salt = [0u8; SALT_LEN];
    let mut nonce = [0u8; NONCE_LEN];
    let mut rng = rand::thread_rng();
    rng.fill_bytes(&mut salt);
    rng.fill_bytes(&mut nonce);

    let kdf_params = KdfParams::default();
    let cipher = cipher_for(password, &salt, kdf_params)?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), seed.as_ref())
        .map_err(|e| WalletError::Key(format!("sealing seed failed: {e}")))?;

    Ok(KeystoreFile {
        version: KEYSTORE_VERSION,
        address: address.clone(),
        crypto: SealedSeed {
            cipher: "aes-256-gcm".into(),
            kdf: "argon2id".into(),
            kdf_params,
            salt: hex::encode(salt),
            nonce: hex::encode(nonce),
            ciphertext: hex::encode(ciphertext),
        },
    })
}

/// Open a keystore, returning the 32-byte seed.
pub fn decrypt_keystore(keystore: &KeystoreFile, password: &str) -> Result<[u8; 32], WalletError> {
    if keystore.version != KEYSTORE_VERSION {
        return Err(WalletError::Key(format!(
            "unsupported keystore version {}",
            keystore.version
        )));
    }
    let sealed = &keystore.crypto;
    let salt = decode_field("salt", &sealed.salt)?;
    let nonce = decode_field("nonce", &sealed.nonce)?;
    let ciphertext = decode_field("ciphertext", &sealed.ciphertext)?;
    if nonce.len() != NONCE_LEN {
        return Err(WalletError::Key(format!(
            "nonce must be {NONCE_LEN} bytes, got {}",
            nonce.len()
        )));
    }

    let cipher = cipher_for(password, &salt, sealed.kdf_params)?;
    let plaintext = cipher
        .decrypt(Nonce::from_slice(&nonce), ciphertext.as_ref())
        .map_err(|_| WalletError::Key("wrong password or corrupted keystore".into()))?;

    plaintext
        .try_into()
        .map_err(|p: Vec<u8>| WalletError::Key(format!("seed must be 32 bytes, got {}", p.len())))
}

/// Open a keystore and rebuild the account key pair.
pub fn unlock_keystore(keystore: &KeystoreFile, password: &str) -> Result<KeyPair, WalletError> {
    Ok(keypair_from_seed(&decrypt_keystore(keystore, password)?))
}

pub fn save_keystore(keystore: &KeystoreFile, path: &Path) -> Result<(), WalletError> {
    let json = serde_json::to_string_pretty(keystore)
        .map_err(|e| WalletError::Other(format!("keystore serialisation failed: {e}")))?;
    std::fs::write(path, json)
        .map_err(|e| WalletError::Other(format!("writing {}: {e}", path.display())))
}

pub fn load_keystore(path: &Path) -> Result<KeystoreFile, WalletError> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| WalletError::Other(format!("reading {}: {e}", path.display())))?;
    serde_json::from_str(&json)
        .map_err(|e| WalletError::Other(format!("invalid keystore {}: {e}", path.display())))
}

fn decode_field(name: &str, value: &str) -> Result<Vec<u8>, WalletError> {
    hex::decode(value).map_err(|e| WalletError::Key(format!("invalid {name} hex: {e}")))
}

fn cipher_for(password: &str, salt: &[u8], params: KdfParams) -> Result<Aes256Gcm, WalletError> {
    let params = Params::new(params.memory, params.iterations, params.parallelism, Some(32))
        .map_err(|e| WalletError::Key(format!("argon2 params: {e}")))?;
    let mut key = [0u8; 32];
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password_into(password.as_bytes(), salt, &mut key)
        .map_err(|e| WalletError::Key(format!("argon2: {e}")))?;
    Aes256Gcm::new_from_slice(&key).map_err(|e| WalletError::Key(format!("aes key: {e}")))
}
