//! Nullable gateways for deterministic testing.
//!
//! Each nullable implements one of the workflow's external seams
//! ([`IndexerGateway`](inscribe_indexer::IndexerGateway),
//! [`SigningGateway`](inscribe_wallet::SigningGateway),
//! [`TransactionSubmitter`](inscribe_wallet::TransactionSubmitter)) and:
//! - Returns scripted values
//! - Records every call for later assertions
//! - Never touches the network
//!
//! Usage: swap the HTTP-backed gateways for nullables in tests.

pub mod indexer;
pub mod signer;
pub mod submitter;

pub use indexer::NullIndexer;
pub use signer::{NullSigner, SignOutcome};
pub use submitter::NullSubmitter;
