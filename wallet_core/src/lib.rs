//! Wallet core for the inscription dashboard.
//!
//! Provides everything the workflow needs from the wallet side:
//! - Message signing gateways: in-page ([`KeySigner`]) and redirect ([`WebWalletSigner`])
//! - Transaction model, gas estimation and signing
//! - Transaction submission and tracking against a chain gateway ([`GatewaySubmitter`])
//! - Encrypted keystore files for the local account key

pub mod account;
pub mod error;
pub mod gateway;
pub mod keystore;
pub mod signer;
pub mod submitter;
pub mod transaction;
pub mod web_wallet;

pub use account::AccountInfo;
pub use error::WalletError;
pub use gateway::GatewaySubmitter;
pub use keystore::{
    decrypt_keystore, encrypt_keystore, load_keystore, save_keystore, unlock_keystore,
    KeystoreFile,
};
pub use signer::{KeySigner, SessionBook, SigningGateway};
pub use submitter::{TrackedTransaction, TransactionStatus, TransactionSubmitter};
pub use transaction::{GasEstimator, Transaction};
pub use web_wallet::WebWalletSigner;
