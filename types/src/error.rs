//! Validation errors shared across crates.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypesError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid transaction hash: {0}")]
    InvalidTxHash(String),

    #[error("invalid content hash: {0}")]
    InvalidContentHash(String),

    #[error("empty {0}")]
    Empty(&'static str),

    #[error("unknown {kind}: {value}")]
    Unknown { kind: &'static str, value: String },
}
