//! Chain gateway (proxy) client implementing transaction submission.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use inscribe_types::{Address, KeyPair, TrackingId, TxHash};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::{AccountInfo, TrackedTransaction, Transaction, TransactionStatus, TransactionSubmitter, WalletError};

/// HTTP client for a chain gateway.
///
/// Holds the account key: transactions handed to [`send`](TransactionSubmitter::send)
/// get the nonce from the last refresh and are signed here.
pub struct GatewaySubmitter {
    http: reqwest::Client,
    gateway_url: String,
    keypair: KeyPair,
    state: Mutex<GatewayState>,
}

#[derive(Default)]
struct GatewayState {
    nonces: HashMap<Address, u64>,
    tracked: HashMap<TrackingId, TxHash>,
}

/// Every gateway response is wrapped in this envelope.
#[derive(Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    #[serde(default)]
    error: String,
    #[serde(default)]
    code: String,
}

#[derive(Deserialize)]
struct AccountData {
    account: RawAccount,
}

#[derive(Deserialize)]
struct RawAccount {
    address: String,
    nonce: u64,
    balance: String,
    #[serde(default)]
    username: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendData {
    tx_hash: String,
}

#[derive(Deserialize)]
struct StatusData {
    status: String,
}

impl GatewaySubmitter {
    /// Create a submitter for the gateway at `gateway_url` signing with `keypair`.
    pub fn new(gateway_url: impl Into<String>, keypair: KeyPair) -> Result<Self, WalletError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            gateway_url: gateway_url.into().trim_end_matches('/').to_string(),
            keypair,
            state: Mutex::new(GatewayState::default()),
        })
    }

    pub fn gateway_url(&self) -> &str {
        &self.gateway_url
    }

    fn state(&self) -> MutexGuard<'_, GatewayState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Unwrap a gateway envelope, turning `error` into [`WalletError::Gateway`].
    async fn read<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, WalletError> {
        let status = response.status();
        let body = response.text().await?;

        let envelope: Envelope<T> = serde_json::from_str(&body).map_err(|e| {
            if status.is_success() {
                WalletError::Gateway(format!("invalid response: {e}"))
            } else {
                WalletError::Gateway(format!("gateway returned HTTP {status}"))
            }
        })?;

        if !envelope.error.is_empty() {
            return Err(WalletError::Gateway(format!(
                "{} ({})",
                envelope.error, envelope.code
            )));
        }
        if !status.is_success() {
            return Err(WalletError::Gateway(format!("gateway returned HTTP {status}")));
        }
        envelope
            .data
            .ok_or_else(|| WalletError::Gateway("response carries no data".into()))
    }
}

#[async_trait]
impl TransactionSubmitter for GatewaySubmitter {
    async fn refresh_account(&self, address: &Address) -> Result<AccountInfo, WalletError> {
        let response = self
            .http
            .get(format!("{}/address/{address}", self.gateway_url))
            .send()
            .await?;
        let data: AccountData = self.read(response).await?;

        let info = AccountInfo {
            address: Address::parse(&data.account.address)?,
            nonce: data.account.nonce,
            balance: data.account.balance,
            username: data.account.username.filter(|u| !u.is_empty()),
        };
        self.state().nonces.insert(info.address.clone(), info.nonce);
        tracing::debug!(%address, nonce = info.nonce, "account refreshed");
        Ok(info)
    }

    async fn send(&self, mut tx: Transaction) -> Result<TrackingId, WalletError> {
        let nonce = self.state().nonces.get(&tx.sender).copied();
        tx.nonce = match nonce {
            Some(nonce) => nonce,
            None => self.refresh_account(&tx.sender).await?.nonce,
        };
        tx.sign(&self.keypair)?;

        let response = self
            .http
            .post(format!("{}/transaction/send", self.gateway_url))
            .json(&tx.wire())
            .send()
            .await?;
        let data: SendData = self.read(response).await?;
        let hash = TxHash::parse(&data.tx_hash)?;

        let tracking_id = TrackingId::random();
        {
            let mut state = self.state();
            state.nonces.insert(tx.sender.clone(), tx.nonce + 1);
            state.tracked.insert(tracking_id.clone(), hash.clone());
        }
        tracing::info!(%tracking_id, tx_hash = %hash, nonce = tx.nonce, "transaction sent");
        Ok(tracking_id)
    }

    async fn status(&self, tracking_id: &TrackingId) -> Result<TrackedTransaction, WalletError> {
        let hash = self
            .state()
            .tracked
            .get(tracking_id)
            .cloned()
            .ok_or_else(|| WalletError::UnknownTracking(tracking_id.clone()))?;

        let response = self
            .http
            .get(format!("{}/transaction/{hash}/status", self.gateway_url))
            .send()
            .await?;
        let data: StatusData = self.read(response).await?;

        Ok(TrackedTransaction {
            tracking_id: tracking_id.clone(),
            hash: Some(hash),
            status: TransactionStatus::from_gateway(&data.status),
        })
    }
}
