use inscribe_crypto::CryptoError;
use inscribe_indexer::IndexerError;
use inscribe_types::TypesError;
use inscribe_wallet::WalletError;
use thiserror::Error;

use crate::InscribeStage;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("indexer error: {0}")]
    Indexer(#[from] IndexerError),

    #[error("wallet error: {0}")]
    Wallet(#[from] WalletError),

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("invalid value: {0}")]
    Types(#[from] TypesError),

    #[error("session storage error: {0}")]
    Storage(String),

    #[error("not ready to inscribe: missing {0}")]
    NotReady(&'static str),

    #[error("invalid inscription transition from {from:?} to {to:?}")]
    InvalidTransition { from: InscribeStage, to: InscribeStage },
}
