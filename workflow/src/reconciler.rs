//! Polling reconciler.
//!
//! Keeps the published inscription list in step with the indexer. The list
//! is re-fetched on mount (a redirect wallet may have just brought the user
//! back) and whenever the processed marker shows up, after which the marker
//! is cleared. While spawned it checks the marker on a fixed interval.

use std::sync::Arc;
use std::time::Duration;

use inscribe_indexer::{IndexerGateway, Inscription};
use inscribe_types::Address;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::{MarkerStore, WorkflowContext, WorkflowError};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

pub struct Reconciler {
    address: Address,
    markers: MarkerStore,
    indexer: Arc<dyn IndexerGateway>,
    inscriptions: watch::Sender<Vec<Inscription>>,
}

impl Reconciler {
    pub fn new(ctx: &WorkflowContext, indexer: Arc<dyn IndexerGateway>) -> Self {
        let (inscriptions, _) = watch::channel(Vec::new());
        Self {
            address: ctx.address.clone(),
            markers: ctx.markers(),
            indexer,
            inscriptions,
        }
    }

    /// Receiver for the latest inscription list.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Inscription>> {
        self.inscriptions.subscribe()
    }

    pub fn inscriptions(&self) -> Vec<Inscription> {
        self.inscriptions.borrow().clone()
    }

    /// Unconditional refresh, then a marker check.
    pub async fn mount(&self) -> Result<(), WorkflowError> {
        self.refresh().await?;
        self.tick().await?;
        Ok(())
    }

    /// Refresh if the marker is set. Returns whether a refresh happened.
    pub async fn tick(&self) -> Result<bool, WorkflowError> {
        if !self.markers.is_set()? {
            return Ok(false);
        }
        self.refresh().await?;
        Ok(true)
    }

    /// Fetch and publish the inscription list, then clear the marker seen
    /// before the fetch.
    ///
    /// A failed fetch leaves the marker alone so the next tick retries.
    pub async fn refresh(&self) -> Result<usize, WorkflowError> {
        let seen = self.markers.snapshot()?;
        let list = self.indexer.inscriptions(&self.address).await?;
        let count = list.len();
        self.inscriptions.send_replace(list);
        self.markers.clear_if_unchanged(seen.as_deref())?;
        tracing::debug!(address = %self.address, count, "inscriptions refreshed");
        Ok(count)
    }

    /// Forget any marker still pending.
    pub fn teardown(&self) -> Result<(), WorkflowError> {
        self.markers.clear()?;
        Ok(())
    }

    /// Mount, then check the marker every `period` on a background task
    /// until the returned handle is shut down or dropped.
    pub fn spawn(self, period: Duration) -> ReconcilerHandle {
        let (shutdown_tx, mut shutdown_rx) = broadcast::channel(1);
        let markers = self.markers.clone();
        let inscriptions = self.subscribe();

        let task = tokio::spawn(async move {
            if let Err(e) = self.mount().await {
                tracing::warn!(error = %e, "reconciler mount failed");
            }
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = self.tick().await {
                            tracing::warn!(error = %e, "reconciler tick failed");
                        }
                    }
                }
            }
        });

        ReconcilerHandle {
            task: Some(task),
            shutdown: shutdown_tx,
            markers,
            inscriptions,
        }
    }
}

/// Owns the reconciler's timer task. Shutting down (or dropping) the handle
/// stops the task and clears the marker.
pub struct ReconcilerHandle {
    task: Option<JoinHandle<()>>,
    shutdown: broadcast::Sender<()>,
    markers: MarkerStore,
    inscriptions: watch::Receiver<Vec<Inscription>>,
}

impl ReconcilerHandle {
    pub fn subscribe(&self) -> watch::Receiver<Vec<Inscription>> {
        self.inscriptions.clone()
    }

    /// Stop the task, wait for it, and clear the marker.
    pub async fn shutdown(mut self) -> Result<(), WorkflowError> {
        let _ = self.shutdown.send(());
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "reconciler task ended abnormally");
            }
        }
        self.markers.clear()?;
        Ok(())
    }
}

impl Drop for ReconcilerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            if let Err(e) = self.markers.clear() {
                tracing::warn!(error = %e, "could not clear marker on teardown");
            }
        }
    }
}
