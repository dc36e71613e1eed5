//! The processed marker: "an inscribe transaction confirmed and the indexer
//! was notified, so the inscription list needs a refresh".

use std::sync::Arc;

use inscribe_types::{Address, Timestamp, TxHash};
use serde::{Deserialize, Serialize};

use crate::storage::{load_record, store_record};
use crate::{SessionStorage, WorkflowError};

const MARKER_PREFIX: &str = "inscription";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileMarker {
    pub tx_hash: TxHash,
    pub set_at: Timestamp,
}

/// Marker slot for one address. Setting replaces any previous marker, so a
/// scope never holds more than one.
#[derive(Clone)]
pub struct MarkerStore {
    storage: Arc<dyn SessionStorage>,
    key: String,
}

impl MarkerStore {
    pub fn new(storage: Arc<dyn SessionStorage>, address: &Address) -> Self {
        Self {
            storage,
            key: format!("{MARKER_PREFIX}:{address}"),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn set(&self, tx_hash: &TxHash) -> Result<(), WorkflowError> {
        let marker = ReconcileMarker {
            tx_hash: tx_hash.clone(),
            set_at: Timestamp::now(),
        };
        store_record(self.storage.as_ref(), &self.key, &marker)?;
        tracing::debug!(key = %self.key, %tx_hash, "processed marker set");
        Ok(())
    }

    pub fn get(&self) -> Result<Option<ReconcileMarker>, WorkflowError> {
        load_record(self.storage.as_ref(), &self.key)
    }

    /// Presence is what counts; an unreadable record still reads as set.
    pub fn is_set(&self) -> Result<bool, WorkflowError> {
        Ok(self.storage.get(&self.key)?.is_some())
    }

    /// The stored marker as raw text, for [`clear_if_unchanged`](Self::clear_if_unchanged).
    pub fn snapshot(&self) -> Result<Option<String>, WorkflowError> {
        self.storage.get(&self.key)
    }

    /// Clear the marker only if it still reads as `snapshot`; a marker set
    /// since then is kept for the next reconciliation.
    pub fn clear_if_unchanged(&self, snapshot: Option<&str>) -> Result<bool, WorkflowError> {
        let current = self.storage.get(&self.key)?;
        match (current.as_deref(), snapshot) {
            (Some(now), Some(seen)) if now == seen => self.clear(),
            _ => Ok(false),
        }
    }

    /// Remove the marker, returning whether one was present.
    pub fn clear(&self) -> Result<bool, WorkflowError> {
        let cleared = self.storage.remove(&self.key)?;
        if cleared {
            tracing::debug!(key = %self.key, "processed marker cleared");
        }
        Ok(cleared)
    }
}
