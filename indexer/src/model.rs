//! Wire and read models for the indexer API.

use inscribe_crypto::decode_payload;
use inscribe_types::{Address, ContentHash, Timestamp, TxHash};
use serde::{Deserialize, Serialize};

/// An inscription as listed by the indexer.
///
/// Records are validated on deserialisation: a malformed record fails the
/// whole listing instead of reaching the display layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawInscription", rename_all = "camelCase")]
pub struct Inscription {
    pub hash: ContentHash,
    pub tx_hash: TxHash,
    pub creator: Address,
    pub owner: Address,
    pub signature: String,
    pub timestamp: Timestamp,
    /// Base64 payload exactly as inscribed.
    pub payload: String,
}

impl Inscription {
    /// The inscribed text.
    pub fn payload_text(&self) -> String {
        // validated in `TryFrom<RawInscription>`
        decode_payload(&self.payload).unwrap_or_default()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawInscription {
    hash: String,
    tx_hash: String,
    creator: String,
    owner: String,
    #[serde(default)]
    signature: String,
    timestamp: u64,
    payload: String,
}

impl TryFrom<RawInscription> for Inscription {
    type Error = String;

    fn try_from(raw: RawInscription) -> Result<Self, Self::Error> {
        decode_payload(&raw.payload).map_err(|e| format!("inscription {}: {e}", raw.hash))?;
        Ok(Self {
            hash: ContentHash::parse(&raw.hash).map_err(|e| e.to_string())?,
            tx_hash: TxHash::parse(&raw.tx_hash).map_err(|e| e.to_string())?,
            creator: Address::parse(&raw.creator).map_err(|e| e.to_string())?,
            owner: Address::parse(&raw.owner).map_err(|e| e.to_string())?,
            signature: raw.signature,
            timestamp: Timestamp::new(raw.timestamp),
            payload: raw.payload,
        })
    }
}

#[derive(Serialize)]
pub(crate) struct GenerateRequest<'a> {
    pub payload: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProcessRequest<'a> {
    pub tx_hash: &'a str,
}

#[derive(Deserialize)]
pub(crate) struct ErrorBody {
    pub message: Option<String>,
}

/// JSON truthiness: `false`, `null`, `0`, `""` are falsy.
pub(crate) fn is_truthy(value: &serde_json::Value) -> bool {
    use serde_json::Value;
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
