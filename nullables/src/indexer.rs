//! Nullable indexer: scripted hashes and listings, recorded calls.

use std::sync::Mutex;

use async_trait::async_trait;
use inscribe_indexer::{IndexerError, IndexerGateway, Inscription};
use inscribe_types::{Address, ContentHash, TxHash};

/// An in-memory indexer service.
///
/// `generate` answers with the configured hash (or failure), `process`
/// with the configured acknowledgement, and `inscriptions` with whatever
/// was registered through [`NullIndexer::add_inscription`].
pub struct NullIndexer {
    state: Mutex<State>,
}

struct State {
    hash: Result<ContentHash, (u16, Option<String>)>,
    acknowledge: bool,
    list_failures: usize,
    inscriptions: Vec<Inscription>,
    generated: Vec<String>,
    processed: Vec<TxHash>,
    listed: Vec<Address>,
}

impl NullIndexer {
    /// An indexer that hashes every payload to `hash` and acknowledges
    /// every processed transaction. Panics on an invalid hash.
    pub fn new(hash: &str) -> Self {
        Self {
            state: Mutex::new(State {
                hash: Ok(ContentHash::parse(hash).unwrap()),
                acknowledge: true,
                list_failures: 0,
                inscriptions: Vec::new(),
                generated: Vec::new(),
                processed: Vec::new(),
                listed: Vec::new(),
            }),
        }
    }

    /// Make `generate` fail with HTTP `status` and an optional service message.
    pub fn fail_generate(&self, status: u16, message: Option<&str>) {
        self.state.lock().unwrap().hash = Err((status, message.map(str::to_string)));
    }

    /// What `process` answers from now on.
    pub fn acknowledge_process(&self, acknowledge: bool) {
        self.state.lock().unwrap().acknowledge = acknowledge;
    }

    /// Make the next `count` listing calls fail.
    pub fn fail_listings(&self, count: usize) {
        self.state.lock().unwrap().list_failures = count;
    }

    pub fn add_inscription(&self, inscription: Inscription) {
        self.state.lock().unwrap().inscriptions.push(inscription);
    }

    /// Payloads passed to `generate`, in call order.
    pub fn generated(&self) -> Vec<String> {
        self.state.lock().unwrap().generated.clone()
    }

    /// Transaction hashes passed to `process`, in call order.
    pub fn processed(&self) -> Vec<TxHash> {
        self.state.lock().unwrap().processed.clone()
    }

    /// Number of `inscriptions` calls, failed ones included.
    pub fn list_calls(&self) -> usize {
        self.state.lock().unwrap().listed.len()
    }

    /// Total gateway calls of any kind.
    pub fn calls(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.generated.len() + state.processed.len() + state.listed.len()
    }
}

#[async_trait]
impl IndexerGateway for NullIndexer {
    async fn generate(&self, payload: &str) -> Result<ContentHash, IndexerError> {
        let mut state = self.state.lock().unwrap();
        state.generated.push(payload.to_string());
        state
            .hash
            .clone()
            .map_err(|(status, message)| IndexerError::Status { status, message })
    }

    async fn process(&self, tx_hash: &TxHash) -> Result<bool, IndexerError> {
        let mut state = self.state.lock().unwrap();
        state.processed.push(tx_hash.clone());
        Ok(state.acknowledge)
    }

    async fn inscriptions(&self, address: &Address) -> Result<Vec<Inscription>, IndexerError> {
        let mut state = self.state.lock().unwrap();
        state.listed.push(address.clone());
        if state.list_failures > 0 {
            state.list_failures -= 1;
            return Err(IndexerError::Status {
                status: 503,
                message: Some("indexer unavailable".into()),
            });
        }
        Ok(state
            .inscriptions
            .iter()
            .filter(|i| &i.owner == address)
            .cloned()
            .collect())
    }
}
