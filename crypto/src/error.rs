use inscribe_types::TypesError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("payload is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("invalid PEM: {0}")]
    InvalidPem(String),

    #[error("public key does not match the secret key")]
    KeyMismatch,

    #[error(transparent)]
    Types(#[from] TypesError),
}
