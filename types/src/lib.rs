//! Fundamental types for the inscription workflow.
//!
//! This crate defines the validated identifiers shared across every other
//! crate in the workspace: account addresses, transaction and content hashes,
//! signing sessions, key material, network environments and timestamps.
//! Every constructor validates its input so that loosely-typed values coming
//! back from external services are rejected at the boundary.

pub mod address;
pub mod error;
pub mod hash;
pub mod keys;
pub mod network;
pub mod session;
pub mod state;
pub mod time;

pub use address::Address;
pub use error::TypesError;
pub use hash::{ContentHash, TxHash};
pub use keys::{KeyPair, PrivateKey, PublicKey, Signature};
pub use network::Environment;
pub use session::{SessionId, SignatureSession, TrackingId};
pub use state::{SignatureStatus, SigningMethod};
pub use time::Timestamp;
