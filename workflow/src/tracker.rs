//! Lifecycle of one submitted inscribe transaction.
//!
//! ```text
//! Submitted ──► Confirmed ──► Notified ──► MarkerSet ──► Reconciled
//!     │
//!     ├──► Failed     (chain rejected the transaction)
//!     └──► TimedOut   (no confirmation within the timeout)
//! ```

use std::time::Duration;

use inscribe_types::{TrackingId, TxHash};
use tokio::time::Instant;

use crate::WorkflowError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InscribeStage {
    Submitted,
    Confirmed,
    Notified,
    MarkerSet,
    Reconciled,
    Failed,
    TimedOut,
}

impl InscribeStage {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Reconciled | Self::Failed | Self::TimedOut)
    }

    pub fn can_advance_to(self, next: Self) -> bool {
        use InscribeStage::*;
        matches!(
            (self, next),
            (Submitted, Confirmed | Failed | TimedOut)
                | (Confirmed, Notified)
                | (Notified, MarkerSet)
                | (MarkerSet, Reconciled)
        )
    }
}

#[derive(Clone, Debug)]
pub struct InscribeSession {
    pub tracking_id: TrackingId,
    pub tx_hash: Option<TxHash>,
    stage: InscribeStage,
    submitted_at: Instant,
    /// Indexer notification queued for `resume` (redirect-style wallets).
    pub(crate) deferred: bool,
}

impl InscribeSession {
    pub fn new(tracking_id: TrackingId) -> Self {
        Self {
            tracking_id,
            tx_hash: None,
            stage: InscribeStage::Submitted,
            submitted_at: Instant::now(),
            deferred: false,
        }
    }

    pub fn stage(&self) -> InscribeStage {
        self.stage
    }

    pub fn confirmed(&self) -> bool {
        matches!(
            self.stage,
            InscribeStage::Confirmed
                | InscribeStage::Notified
                | InscribeStage::MarkerSet
                | InscribeStage::Reconciled
        )
    }

    /// Whether the indexer notification was handed off to a later resume.
    pub fn is_deferred(&self) -> bool {
        self.deferred
    }

    /// Still unconfirmed after `timeout`.
    pub fn is_overdue(&self, timeout: Duration) -> bool {
        self.stage == InscribeStage::Submitted && self.submitted_at.elapsed() >= timeout
    }

    pub fn advance(&mut self, next: InscribeStage) -> Result<(), WorkflowError> {
        if !self.stage.can_advance_to(next) {
            return Err(WorkflowError::InvalidTransition {
                from: self.stage,
                to: next,
            });
        }
        tracing::debug!(tracking_id = %self.tracking_id, from = ?self.stage, to = ?next, "inscription advanced");
        self.stage = next;
        Ok(())
    }
}
