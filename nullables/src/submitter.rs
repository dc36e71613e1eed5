//! Nullable transaction submitter: records transactions, scripted statuses.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use inscribe_types::{Address, TrackingId, TxHash};
use inscribe_wallet::{
    AccountInfo, TrackedTransaction, Transaction, TransactionStatus, TransactionSubmitter,
    WalletError,
};

/// Hash reported for every accepted transaction.
pub const NULL_TX_HASH: &str = "5d7c1ba0e8e06fb3d03d8a0f2c1aee2a6c8c0d0b6c3a0d6de1e0f4c2a7b9c1d3";

/// A submission gateway that accepts transactions without sending them.
///
/// Statuses are served from a script: each `status` call pops the next
/// entry and the last entry repeats. An empty script reads as pending.
pub struct NullSubmitter {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    nonce: u64,
    statuses: VecDeque<TransactionStatus>,
    refresh_error: Option<String>,
    send_error: Option<String>,
    refreshed: Vec<Address>,
    sent: Vec<Transaction>,
    status_calls: usize,
    events: Vec<&'static str>,
}

impl NullSubmitter {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }

    /// Statuses to report, in order.
    pub fn script_statuses(&self, statuses: impl IntoIterator<Item = TransactionStatus>) {
        self.state.lock().unwrap().statuses = statuses.into_iter().collect();
    }

    pub fn set_nonce(&self, nonce: u64) {
        self.state.lock().unwrap().nonce = nonce;
    }

    pub fn fail_refresh(&self, message: Option<&str>) {
        self.state.lock().unwrap().refresh_error = message.map(str::to_string);
    }

    pub fn fail_send(&self, message: Option<&str>) {
        self.state.lock().unwrap().send_error = message.map(str::to_string);
    }

    /// Transactions accepted by `send`, in call order.
    pub fn sent(&self) -> Vec<Transaction> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn refresh_calls(&self) -> usize {
        self.state.lock().unwrap().refreshed.len()
    }

    pub fn status_calls(&self) -> usize {
        self.state.lock().unwrap().status_calls
    }

    /// `"refresh"` / `"send"` in the order they happened.
    pub fn events(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().events.clone()
    }
}

impl Default for NullSubmitter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransactionSubmitter for NullSubmitter {
    async fn refresh_account(&self, address: &Address) -> Result<AccountInfo, WalletError> {
        let mut state = self.state.lock().unwrap();
        state.refreshed.push(address.clone());
        state.events.push("refresh");
        if let Some(message) = state.refresh_error.clone() {
            return Err(WalletError::Gateway(message));
        }
        Ok(AccountInfo {
            address: address.clone(),
            nonce: state.nonce,
            balance: "0".into(),
            username: None,
        })
    }

    async fn send(&self, mut tx: Transaction) -> Result<TrackingId, WalletError> {
        let mut state = self.state.lock().unwrap();
        state.events.push("send");
        if let Some(message) = state.send_error.clone() {
            return Err(WalletError::Gateway(message));
        }
        tx.nonce = state.nonce;
        state.nonce += 1;
        state.sent.push(tx);
        Ok(TrackingId::random())
    }

    async fn status(&self, tracking_id: &TrackingId) -> Result<TrackedTransaction, WalletError> {
        let mut state = self.state.lock().unwrap();
        state.status_calls += 1;
        let status = if state.statuses.len() > 1 {
            state.statuses.pop_front().unwrap_or(TransactionStatus::Pending)
        } else {
            state.statuses.front().copied().unwrap_or(TransactionStatus::Pending)
        };
        Ok(TrackedTransaction {
            tracking_id: tracking_id.clone(),
            hash: Some(TxHash::parse(NULL_TX_HASH)?),
            status,
        })
    }
}
