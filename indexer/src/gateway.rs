//! Indexer gateway port.

use async_trait::async_trait;
use inscribe_types::{Address, ContentHash, TxHash};

use crate::{IndexerError, Inscription};

/// Operations the workflow needs from the inscription indexer.
#[async_trait]
pub trait IndexerGateway: Send + Sync {
    /// Register a base64 payload and return its content hash.
    async fn generate(&self, payload: &str) -> Result<ContentHash, IndexerError>;

    /// Tell the indexer an inscribe transaction was confirmed.
    ///
    /// Returns whether the indexer accepted it.
    async fn process(&self, tx_hash: &TxHash) -> Result<bool, IndexerError>;

    /// Inscriptions owned by `address`, in the order the indexer returns them.
    async fn inscriptions(&self, address: &Address) -> Result<Vec<Inscription>, IndexerError>;
}
