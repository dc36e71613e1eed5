//! Transaction model, gas estimation and signing.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use inscribe_crypto::sign_message;
use inscribe_types::{Address, KeyPair};
use serde::{Deserialize, Serialize};

use crate::WalletError;

/// Default gas price in the smallest denomination.
pub const DEFAULT_GAS_PRICE: u64 = 1_000_000_000;

/// Transaction format version.
pub const TX_VERSION: u32 = 1;

/// Gas cost model for plain value transfers carrying data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GasEstimator {
    pub min_gas_limit: u64,
    pub gas_per_data_byte: u64,
}

impl Default for GasEstimator {
    fn default() -> Self {
        Self {
            min_gas_limit: 50_000,
            gas_per_data_byte: 1_500,
        }
    }
}

impl GasEstimator {
    /// Gas for a transfer whose data field is `data_len` bytes long.
    pub fn for_transfer(&self, data_len: usize) -> u64 {
        self.min_gas_limit
            .saturating_add(self.gas_per_data_byte.saturating_mul(data_len as u64))
    }
}

/// An unsigned or signed chain transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub nonce: u64,
    pub value: String,
    pub receiver: Address,
    pub sender: Address,
    pub gas_price: u64,
    pub gas_limit: u64,
    /// Raw data field; base64-encoded on the wire.
    pub data: String,
    pub chain_id: String,
    pub version: u32,
    /// Hex Ed25519 signature over [`Transaction::signing_bytes`].
    pub signature: Option<String>,
}

/// Wire form accepted by the gateway. Field order is the signing order.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTransaction {
    pub nonce: u64,
    pub value: String,
    pub receiver: String,
    pub sender: String,
    pub gas_price: u64,
    pub gas_limit: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(rename = "chainID")]
    pub chain_id: String,
    pub version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl Transaction {
    /// A zero-value transaction from `sender` to itself carrying `data`.
    pub fn self_transfer(sender: Address, data: String, gas_limit: u64, chain_id: &str) -> Self {
        Self {
            nonce: 0,
            value: "0".to_string(),
            receiver: sender.clone(),
            sender,
            gas_price: DEFAULT_GAS_PRICE,
            gas_limit,
            data,
            chain_id: chain_id.to_string(),
            version: TX_VERSION,
            signature: None,
        }
    }

    pub fn wire(&self) -> WireTransaction {
        WireTransaction {
            nonce: self.nonce,
            value: self.value.clone(),
            receiver: self.receiver.to_string(),
            sender: self.sender.to_string(),
            gas_price: self.gas_price,
            gas_limit: self.gas_limit,
            data: (!self.data.is_empty()).then(|| STANDARD.encode(self.data.as_bytes())),
            chain_id: self.chain_id.clone(),
            version: self.version,
            signature: self.signature.clone(),
        }
    }

    /// Canonical JSON of the unsigned transaction.
    pub fn signing_bytes(&self) -> Result<Vec<u8>, WalletError> {
        let mut wire = self.wire();
        wire.signature = None;
        serde_json::to_vec(&wire)
            .map_err(|e| WalletError::TransactionBuild(format!("serialisation failed: {e}")))
    }

    pub fn sign(&mut self, keypair: &KeyPair) -> Result<(), WalletError> {
        let bytes = self.signing_bytes()?;
        self.signature = Some(sign_message(&bytes, &keypair.private).to_hex());
        Ok(())
    }
}
