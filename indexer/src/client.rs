//! HTTP implementation of the indexer gateway.

use std::time::Duration;

use async_trait::async_trait;
use inscribe_types::{Address, ContentHash, TxHash};
use reqwest::RequestBuilder;

use crate::model::{is_truthy, ErrorBody, GenerateRequest, ProcessRequest};
use crate::{IndexerError, IndexerGateway, Inscription};

/// HTTP client for the inscription indexer.
///
/// Every request carries `Authorization: Bearer <token>` when a token is
/// configured. A missing token is not an error here: the service decides
/// whether the request is authorised.
#[derive(Clone)]
pub struct IndexerClient {
    http: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
}

impl IndexerClient {
    /// Create a client for the indexer at `base_url` (e.g. `https://indexer.example`).
    pub fn new(base_url: impl Into<String>) -> Result<Self, IndexerError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_token: None,
        })
    }

    /// Use the login session's token for subsequent requests.
    pub fn with_auth_token(mut self, token: Option<String>) -> Self {
        self.auth_token = token.filter(|t| !t.is_empty());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send a request and return the body of a successful response.
    async fn send(&self, request: RequestBuilder) -> Result<String, IndexerError> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.message);
            tracing::debug!(status = status.as_u16(), ?message, "indexer request rejected");
            return Err(IndexerError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl IndexerGateway for IndexerClient {
    async fn generate(&self, payload: &str) -> Result<ContentHash, IndexerError> {
        tracing::debug!(len = payload.len(), "requesting content hash");
        let body = self
            .send(
                self.http
                    .post(self.url("generate"))
                    .json(&GenerateRequest { payload }),
            )
            .await?;

        // The hash comes back either as a JSON string or as bare text.
        let raw = serde_json::from_str::<String>(&body).unwrap_or(body);
        ContentHash::parse(&raw).map_err(|e| IndexerError::InvalidResponse(e.to_string()))
    }

    async fn process(&self, tx_hash: &TxHash) -> Result<bool, IndexerError> {
        tracing::debug!(%tx_hash, "notifying indexer");
        let body = self
            .send(self.http.post(self.url("process")).json(&ProcessRequest {
                tx_hash: tx_hash.as_str(),
            }))
            .await?;

        if body.trim().is_empty() {
            return Ok(false);
        }
        let value: serde_json::Value = serde_json::from_str(&body)
            .unwrap_or_else(|_| serde_json::Value::String(body.trim().to_string()));
        Ok(is_truthy(&value))
    }

    async fn inscriptions(&self, address: &Address) -> Result<Vec<Inscription>, IndexerError> {
        let body = self
            .send(self.http.get(self.url(&format!("{address}/inscriptions"))))
            .await?;
        let inscriptions: Vec<Inscription> = serde_json::from_str(&body)
            .map_err(|e| IndexerError::InvalidResponse(e.to_string()))?;
        tracing::debug!(%address, count = inscriptions.len(), "fetched inscriptions");
        Ok(inscriptions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_dropped() {
        let client = IndexerClient::new("https://indexer.example/").unwrap();
        assert_eq!(client.base_url(), "https://indexer.example");
        assert_eq!(client.url("generate"), "https://indexer.example/generate");
    }

    #[test]
    fn empty_token_means_no_token() {
        let client = IndexerClient::new("http://localhost")
            .unwrap()
            .with_auth_token(Some(String::new()));
        assert!(client.auth_token.is_none());
    }
}
