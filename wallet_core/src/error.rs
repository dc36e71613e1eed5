use inscribe_crypto::CryptoError;
use inscribe_types::{TrackingId, TypesError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("key error: {0}")]
    Key(String),

    #[error("signing error: {0}")]
    Signing(String),

    #[error("invalid wallet callback: {0}")]
    Callback(String),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("transaction building error: {0}")]
    TransactionBuild(String),

    #[error("gateway error: {0}")]
    Gateway(String),

    #[error("gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unknown tracking id: {0}")]
    UnknownTracking(TrackingId),

    #[error(transparent)]
    Types(#[from] TypesError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("{0}")]
    Other(String),
}
