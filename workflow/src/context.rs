use std::sync::Arc;

use inscribe_types::{Address, SigningMethod};

use crate::{DeferredNotifications, MarkerStore, ResumeStore, SessionStorage};

/// What a workflow instance is bound to: the account, how it signs, where
/// redirect wallets send the user back, and the storage that survives the
/// round trip.
///
/// The controller and reconciler for one account share a context. Markers
/// and resume records are keyed by the address, so contexts for different
/// accounts can share one storage.
#[derive(Clone)]
pub struct WorkflowContext {
    pub storage: Arc<dyn SessionStorage>,
    pub address: Address,
    pub signing_method: SigningMethod,
    pub callback_url: String,
}

impl WorkflowContext {
    pub fn new(
        storage: Arc<dyn SessionStorage>,
        address: Address,
        signing_method: SigningMethod,
        callback_url: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            address,
            signing_method,
            callback_url: callback_url.into(),
        }
    }

    pub fn markers(&self) -> MarkerStore {
        MarkerStore::new(self.storage.clone(), &self.address)
    }

    pub fn resume_store(&self) -> ResumeStore {
        ResumeStore::new(self.storage.clone(), &self.address)
    }

    pub fn deferred_notifications(&self) -> DeferredNotifications {
        DeferredNotifications::new(self.storage.clone(), &self.address)
    }
}
