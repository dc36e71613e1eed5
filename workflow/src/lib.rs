//! The inscription workflow.
//!
//! - [`WorkflowController`] takes a message through hashing, signing,
//!   transaction submission and confirmation
//! - [`Reconciler`] keeps the inscription list current, driven by the
//!   processed marker the controller sets
//! - [`WorkflowContext`] binds both to one account and to the
//!   [`SessionStorage`] that survives redirect round trips

pub mod context;
pub mod controller;
pub mod draft;
pub mod error;
pub mod marker;
pub mod reconciler;
pub mod resume;
pub mod storage;
pub mod tracker;

pub use context::WorkflowContext;
pub use controller::{
    HashAuthority, ResumeOutcome, SubmitOutcome, ViewState, WorkflowController,
    WorkflowSettings, DATA_SEPARATOR, INSCRIBE_GAS_SURCHARGE, INSCRIBE_MARKER,
};
pub use draft::{InscriptionDraft, Notice, NoticeLevel};
pub use error::WorkflowError;
pub use marker::{MarkerStore, ReconcileMarker};
pub use reconciler::{Reconciler, ReconcilerHandle, DEFAULT_POLL_INTERVAL};
pub use resume::{DeferredNotifications, PendingInscription, ResumeStore};
pub use storage::{FileStorage, MemoryStorage, SessionStorage};
pub use tracker::{InscribeSession, InscribeStage};
