//! Transaction submission gateway port.

use async_trait::async_trait;
use inscribe_types::{Address, TrackingId, TxHash};
use serde::{Deserialize, Serialize};

use crate::{AccountInfo, Transaction, WalletError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Successful,
    Failed,
}

impl TransactionStatus {
    /// Map a gateway status string.
    pub fn from_gateway(raw: &str) -> Self {
        match raw {
            "success" | "successful" | "executed" => Self::Successful,
            "fail" | "failed" | "invalid" => Self::Failed,
            _ => Self::Pending,
        }
    }
}

/// Snapshot of a submitted transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackedTransaction {
    pub tracking_id: TrackingId,
    /// Known once the gateway accepted the transaction.
    pub hash: Option<TxHash>,
    pub status: TransactionStatus,
}

/// Builds-on-behalf, signs and broadcasts transactions, then tracks them.
#[async_trait]
pub trait TransactionSubmitter: Send + Sync {
    /// Re-read account state (nonce) ahead of sending.
    async fn refresh_account(&self, address: &Address) -> Result<AccountInfo, WalletError>;

    /// Sign and broadcast `tx`, returning an id to track it with.
    async fn send(&self, tx: Transaction) -> Result<TrackingId, WalletError>;

    async fn status(&self, tracking_id: &TrackingId) -> Result<TrackedTransaction, WalletError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_status_mapping() {
        assert_eq!(TransactionStatus::from_gateway("success"), TransactionStatus::Successful);
        assert_eq!(TransactionStatus::from_gateway("executed"), TransactionStatus::Successful);
        assert_eq!(TransactionStatus::from_gateway("fail"), TransactionStatus::Failed);
        assert_eq!(TransactionStatus::from_gateway("invalid"), TransactionStatus::Failed);
        assert_eq!(TransactionStatus::from_gateway("pending"), TransactionStatus::Pending);
        assert_eq!(TransactionStatus::from_gateway("received"), TransactionStatus::Pending);
    }
}
