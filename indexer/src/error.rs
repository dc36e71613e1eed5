use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("indexer request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("indexer returned HTTP {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Status { status: u16, message: Option<String> },

    #[error("invalid indexer response: {0}")]
    InvalidResponse(String),
}

impl IndexerError {
    /// The human-readable message the service attached to a failure, if any.
    pub fn service_message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}
