//! Records that carry a redirect-wallet flow across page loads.
//!
//! Before the user is sent to a redirect wallet the draft is persisted, so
//! the callback (arriving in a fresh page or process) can rehydrate it and
//! continue after the signature step. Confirmed transactions whose indexer
//! notification was deferred are queued separately, so a new draft never
//! displaces them.

use std::sync::Arc;

use inscribe_types::{Address, ContentHash, SessionId, TxHash};
use serde::{Deserialize, Serialize};

use crate::storage::{load_record, store_record};
use crate::{SessionStorage, WorkflowError};

const RESUME_PREFIX: &str = "inscription-resume";
const NOTIFY_PREFIX: &str = "inscription-notify";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingInscription {
    pub session_id: SessionId,
    pub encoded_payload: String,
    pub content_hash: ContentHash,
}

/// The draft waiting for a wallet callback. One per address.
#[derive(Clone)]
pub struct ResumeStore {
    storage: Arc<dyn SessionStorage>,
    key: String,
}

impl ResumeStore {
    pub fn new(storage: Arc<dyn SessionStorage>, address: &Address) -> Self {
        Self {
            storage,
            key: format!("{RESUME_PREFIX}:{address}"),
        }
    }

    pub fn save(&self, record: &PendingInscription) -> Result<(), WorkflowError> {
        store_record(self.storage.as_ref(), &self.key, record)
    }

    pub fn load(&self) -> Result<Option<PendingInscription>, WorkflowError> {
        load_record(self.storage.as_ref(), &self.key)
    }

    pub fn clear(&self) -> Result<bool, WorkflowError> {
        self.storage.remove(&self.key)
    }
}

/// Confirmed transactions still owed an indexer notification, oldest first.
#[derive(Clone)]
pub struct DeferredNotifications {
    storage: Arc<dyn SessionStorage>,
    key: String,
}

impl DeferredNotifications {
    pub fn new(storage: Arc<dyn SessionStorage>, address: &Address) -> Self {
        Self {
            storage,
            key: format!("{NOTIFY_PREFIX}:{address}"),
        }
    }

    /// Queue `hash` unless it is already queued.
    pub fn push(&self, hash: &TxHash) -> Result<(), WorkflowError> {
        self.modify(|queue| {
            if !queue.contains(hash) {
                queue.push(hash.clone());
            }
        })
    }

    pub fn pending(&self) -> Result<Vec<TxHash>, WorkflowError> {
        Ok(load_record(self.storage.as_ref(), &self.key)?.unwrap_or_default())
    }

    /// Drop `hash` from the queue, deleting the record once it is empty.
    pub fn remove(&self, hash: &TxHash) -> Result<(), WorkflowError> {
        self.modify(|queue| queue.retain(|queued| queued != hash))
    }

    fn modify(&self, mut f: impl FnMut(&mut Vec<TxHash>)) -> Result<(), WorkflowError> {
        let key = &self.key;
        self.storage.update(key, &mut |current| {
            let mut queue: Vec<TxHash> = match current {
                Some(raw) => serde_json::from_str(&raw).map_err(|e| {
                    WorkflowError::Storage(format!("malformed record {key}: {e}"))
                })?,
                None => Vec::new(),
            };
            f(&mut queue);
            if queue.is_empty() {
                return Ok(None);
            }
            serde_json::to_string(&queue)
                .map(Some)
                .map_err(|e| WorkflowError::Storage(format!("serialising {key}: {e}")))
        })
    }
}
