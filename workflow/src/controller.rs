//! The inscription workflow controller.
//!
//! Drives a message from free text to an on-chain inscription:
//!
//! 1. `submit` encodes the message, obtains its content hash and starts a
//!    signature over the encoded payload.
//! 2. `inscribe` builds the `inscribe@<payload>@<hash>@<signature>`
//!    self-transfer once the signature is in, and submits it.
//! 3. `poll_confirmation` follows the transaction until it confirms, then
//!    tells the indexer and sets the processed marker for the reconciler.
//!
//! Redirect wallets break the flow in two: the draft is persisted before the
//! user leaves, and `resume` picks it up from the wallet's callback. Their
//! indexer notifications are queued on confirmation and sent by `resume`.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use inscribe_crypto::{content_hash, encode_payload};
use inscribe_indexer::IndexerGateway;
use inscribe_types::{ContentHash, SessionId, SignatureSession, SignatureStatus, TrackingId, TxHash};
use inscribe_wallet::{
    GasEstimator, SigningGateway, Transaction, TransactionStatus, TransactionSubmitter,
};
use serde::{Deserialize, Serialize};

use crate::{
    InscribeSession, InscribeStage, InscriptionDraft, Notice, PendingInscription,
    WorkflowContext, WorkflowError,
};

/// Leading field of the transaction data.
pub const INSCRIBE_MARKER: &str = "inscribe";

/// Separates the fields of the transaction data.
pub const DATA_SEPARATOR: char = '@';

/// Extra gas on top of the plain transfer estimate, covering the indexer's
/// processing of the inscription.
pub const INSCRIBE_GAS_SURCHARGE: u64 = 5_000_000;

pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(120);

/// Who computes the content hash of a payload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAuthority {
    /// The indexer's `/generate` endpoint.
    #[default]
    Indexer,
    /// Blake2b-256 computed locally.
    Local,
}

impl HashAuthority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Indexer => "indexer",
            Self::Local => "local",
        }
    }
}

impl fmt::Display for HashAuthority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAuthority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "indexer" | "server" | "remote" => Ok(Self::Indexer),
            "local" | "client" => Ok(Self::Local),
            other => Err(format!("unknown hash authority: {other}")),
        }
    }
}

#[derive(Clone, Debug)]
pub struct WorkflowSettings {
    pub chain_id: String,
    pub hash_authority: HashAuthority,
    pub confirmation_timeout: Duration,
    pub gas: GasEstimator,
}

impl WorkflowSettings {
    pub fn new(chain_id: impl Into<String>) -> Self {
        Self {
            chain_id: chain_id.into(),
            hash_authority: HashAuthority::default(),
            confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
            gas: GasEstimator::default(),
        }
    }

    pub fn with_hash_authority(mut self, authority: HashAuthority) -> Self {
        self.hash_authority = authority;
        self
    }

    pub fn with_confirmation_timeout(mut self, timeout: Duration) -> Self {
        self.confirmation_timeout = timeout;
        self
    }
}

/// What the surface should show.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewState {
    Idle,
    AwaitingSignature,
    Success,
    /// Signature cancelled or failed: offer "try again".
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank message; nothing happened.
    Ignored,
    /// No content hash could be obtained. A notice was queued.
    HashFailed,
    /// The signing gateway refused to start. A notice was queued.
    SigningUnavailable,
    Started {
        session_id: SessionId,
        status: SignatureStatus,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResumeOutcome {
    NothingPending,
    /// A draft is waiting for the wallet's callback URL.
    AwaitingCallback,
    /// The callback resolved the signature.
    Signature(SignatureStatus),
    /// Deferred indexer notifications were sent; `acknowledged` holds when
    /// the indexer accepted all of them.
    Notified { acknowledged: bool },
}

pub struct WorkflowController {
    ctx: WorkflowContext,
    settings: WorkflowSettings,
    indexer: Arc<dyn IndexerGateway>,
    signer: Arc<dyn SigningGateway>,
    submitter: Arc<dyn TransactionSubmitter>,
    draft: InscriptionDraft,
    session_id: Option<SessionId>,
    inscription: Option<InscribeSession>,
    notices: Vec<Notice>,
}

impl WorkflowController {
    /// The signer decides the signing method; a context that disagrees is
    /// corrected.
    pub fn new(
        mut ctx: WorkflowContext,
        settings: WorkflowSettings,
        indexer: Arc<dyn IndexerGateway>,
        signer: Arc<dyn SigningGateway>,
        submitter: Arc<dyn TransactionSubmitter>,
    ) -> Self {
        let method = signer.method();
        if ctx.signing_method != method {
            tracing::warn!(context = %ctx.signing_method, signer = %method, "signing method taken from signer");
            ctx.signing_method = method;
        }
        Self {
            ctx,
            settings,
            indexer,
            signer,
            submitter,
            draft: InscriptionDraft::default(),
            session_id: None,
            inscription: None,
            notices: Vec::new(),
        }
    }

    pub fn context(&self) -> &WorkflowContext {
        &self.ctx
    }

    pub fn draft(&self) -> &InscriptionDraft {
        &self.draft
    }

    pub fn set_message(&mut self, text: impl Into<String>) {
        self.draft.raw_message = text.into();
    }

    /// The signature session this controller is following, if the signing
    /// gateway still knows it.
    pub fn signature_session(&self) -> Option<SignatureSession> {
        self.session_id
            .as_ref()
            .and_then(|id| self.signer.session(id))
    }

    pub fn inscription(&self) -> Option<&InscribeSession> {
        self.inscription.as_ref()
    }

    pub fn view(&self) -> ViewState {
        match self.signature_session() {
            Some(session) if session.has_message() => match session.status {
                SignatureStatus::Pending => ViewState::AwaitingSignature,
                SignatureStatus::Signed => ViewState::Success,
                SignatureStatus::Cancelled | SignatureStatus::Failed => ViewState::Error,
            },
            _ => ViewState::Idle,
        }
    }

    pub fn is_success(&self) -> bool {
        self.view() == ViewState::Success
    }

    pub fn is_error(&self) -> bool {
        self.view() == ViewState::Error
    }

    /// Drain the queued notices.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Start inscribing `raw_message`.
    ///
    /// A blank message is ignored without touching any gateway. Otherwise
    /// the previous signature session is aborted, the message is cleared
    /// from the draft, and the hash must be obtained before signing starts.
    pub async fn submit(&mut self, raw_message: &str) -> Result<SubmitOutcome, WorkflowError> {
        if raw_message.trim().is_empty() {
            return Ok(SubmitOutcome::Ignored);
        }
        if self.session_id.take().is_some() {
            self.signer.abort();
        }

        self.draft.clear();
        let encoded = encode_payload(raw_message);
        self.draft.encoded_payload = Some(encoded.clone());

        let hash = match self.content_hash(&encoded).await {
            Ok(hash) => hash,
            Err(notice) => {
                self.draft.clear();
                self.notices.push(notice);
                return Ok(SubmitOutcome::HashFailed);
            }
        };
        self.draft.content_hash = Some(hash.clone());

        let session_id = match self
            .signer
            .sign_message(&encoded, &self.ctx.callback_url)
            .await
        {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(error = %e, "signing gateway refused the payload");
                self.notices.push(Notice::error(format!("Error signing inscription: {e}")));
                return Ok(SubmitOutcome::SigningUnavailable);
            }
        };

        if self.ctx.signing_method.is_redirect() {
            self.ctx.resume_store().save(&PendingInscription {
                session_id: session_id.clone(),
                encoded_payload: encoded,
                content_hash: hash,
            })?;
        }

        let status = self
            .signer
            .session(&session_id)
            .map(|s| s.status)
            .unwrap_or(SignatureStatus::Pending);
        tracing::info!(%session_id, ?status, method = %self.ctx.signing_method, "signature requested");
        self.session_id = Some(session_id.clone());
        Ok(SubmitOutcome::Started { session_id, status })
    }

    async fn content_hash(&self, encoded: &str) -> Result<ContentHash, Notice> {
        match self.settings.hash_authority {
            HashAuthority::Local => Ok(content_hash(encoded)),
            HashAuthority::Indexer => self.indexer.generate(encoded).await.map_err(|e| {
                tracing::warn!(error = %e, "indexer failed to hash payload");
                match e.service_message() {
                    Some(message) => {
                        Notice::error(format!("Error generating inscription hash: {message}"))
                    }
                    None => Notice::error("Error generating hash for inscription"),
                }
            }),
        }
    }

    /// Cancel the pending signature and drop the draft. Safe to repeat.
    ///
    /// Queued indexer notifications are kept.
    pub fn abort(&mut self) {
        if self.session_id.take().is_some() {
            self.signer.abort();
        }
        self.draft.clear();

        if let Err(e) = self.ctx.resume_store().clear() {
            tracing::warn!(error = %e, "could not discard resume record");
        }
    }

    /// Build and submit the inscribe transaction for the signed draft.
    ///
    /// Failures leave the draft in place so the call can be retried.
    pub async fn inscribe(&mut self) -> Result<TrackingId, WorkflowError> {
        let session = self
            .signature_session()
            .ok_or(WorkflowError::NotReady("signature session"))?;
        let signature = session
            .signed_signature()
            .ok_or(WorkflowError::NotReady("signature"))?;
        let (payload, hash) = self
            .draft
            .ready()
            .ok_or(WorkflowError::NotReady("content hash"))?;

        let data = [INSCRIBE_MARKER, payload, hash.as_str(), signature]
            .join(&DATA_SEPARATOR.to_string());
        let gas_limit = self.settings.gas.for_transfer(payload.len()) + INSCRIBE_GAS_SURCHARGE;

        self.submitter.refresh_account(&self.ctx.address).await?;
        let tx = Transaction::self_transfer(
            self.ctx.address.clone(),
            data,
            gas_limit,
            &self.settings.chain_id,
        );
        let tracking_id = self.submitter.send(tx).await?;
        tracing::info!(%tracking_id, gas_limit, "inscribe transaction submitted");

        self.draft.clear();
        if self.ctx.signing_method.is_redirect() {
            self.ctx.resume_store().clear()?;
        }
        self.inscription = Some(InscribeSession::new(tracking_id.clone()));
        Ok(tracking_id)
    }

    /// Advance the tracked inscription as far as it can go right now.
    ///
    /// Returns the stage reached, or `None` when nothing is tracked.
    /// Transient gateway failures are logged and retried on the next poll.
    pub async fn poll_confirmation(&mut self) -> Result<Option<InscribeStage>, WorkflowError> {
        let Some(mut session) = self.inscription.take() else {
            return Ok(None);
        };
        let result = self.step(&mut session).await;
        let stage = session.stage();
        self.inscription = Some(session);
        result.map(|_| Some(stage))
    }

    async fn step(&mut self, session: &mut InscribeSession) -> Result<(), WorkflowError> {
        loop {
            match session.stage() {
                InscribeStage::Submitted => {
                    if session.is_overdue(self.settings.confirmation_timeout) {
                        tracing::warn!(tracking_id = %session.tracking_id, "inscription confirmation timed out");
                        session.advance(InscribeStage::TimedOut)?;
                        self.notices.push(Notice::error(
                            "Inscription transaction was not confirmed in time",
                        ));
                        return Ok(());
                    }
                    let tracked = match self.submitter.status(&session.tracking_id).await {
                        Ok(tracked) => tracked,
                        Err(e) => {
                            tracing::warn!(error = %e, "transaction status unavailable");
                            return Ok(());
                        }
                    };
                    match (tracked.status, tracked.hash) {
                        (TransactionStatus::Successful, Some(hash)) => {
                            tracing::info!(tx_hash = %hash, "inscribe transaction confirmed");
                            session.tx_hash = Some(hash);
                            session.advance(InscribeStage::Confirmed)?;
                        }
                        (TransactionStatus::Failed, hash) => {
                            session.tx_hash = hash;
                            session.advance(InscribeStage::Failed)?;
                            self.notices.push(Notice::error("Inscription transaction failed"));
                            return Ok(());
                        }
                        _ => return Ok(()),
                    }
                }
                InscribeStage::Confirmed => {
                    let Some(hash) = session.tx_hash.clone() else {
                        return Ok(());
                    };
                    if self.ctx.signing_method.is_redirect() {
                        if !session.deferred {
                            self.ctx.deferred_notifications().push(&hash)?;
                            session.deferred = true;
                            tracing::info!("indexer notification deferred to resume");
                        }
                        return Ok(());
                    }
                    match self.notify(&hash).await {
                        Ok(acknowledged) => {
                            session.advance(InscribeStage::Notified)?;
                            if !acknowledged {
                                return Ok(());
                            }
                            session.advance(InscribeStage::MarkerSet)?;
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, tx_hash = %hash, "indexer notification failed");
                            return Ok(());
                        }
                    }
                }
                InscribeStage::MarkerSet => {
                    if self.ctx.markers().is_set()? {
                        return Ok(());
                    }
                    session.advance(InscribeStage::Reconciled)?;
                    self.notices.push(Notice::info("Inscription recorded"));
                }
                InscribeStage::Notified
                | InscribeStage::Reconciled
                | InscribeStage::Failed
                | InscribeStage::TimedOut => return Ok(()),
            }
        }
    }

    /// Tell the indexer `hash` landed; on acknowledgement, set the marker.
    async fn notify(&self, hash: &TxHash) -> Result<bool, WorkflowError> {
        let acknowledged = self.indexer.process(hash).await?;
        if acknowledged {
            self.ctx.markers().set(hash)?;
        } else {
            tracing::warn!(tx_hash = %hash, "indexer did not acknowledge inscription");
        }
        Ok(acknowledged)
    }

    /// Pick up a flow interrupted by a redirect wallet.
    ///
    /// Queued indexer notifications are sent first. Then `callback_url` (the
    /// URL the wallet sent the user back to), if given, resolves the pending
    /// signature and rehydrates the draft, after which
    /// [`inscribe`](Self::inscribe) can proceed.
    ///
    /// A callback outcome takes precedence in the result. A failed
    /// notification stays queued; it fails the call only when there is no
    /// callback to complete.
    pub async fn resume(
        &mut self,
        callback_url: Option<&str>,
    ) -> Result<ResumeOutcome, WorkflowError> {
        let notified = match self.flush_deferred().await {
            Ok(notified) => notified,
            Err(e) if callback_url.is_some() => {
                tracing::warn!(error = %e, "deferred indexer notification failed");
                None
            }
            Err(e) => return Err(e),
        };

        let store = self.ctx.resume_store();
        let record = store.load()?;
        let (record, callback_url) = match (record, callback_url) {
            (Some(record), Some(url)) => (record, url),
            (record, _) => {
                return Ok(match (notified, record) {
                    (Some(acknowledged), _) => ResumeOutcome::Notified { acknowledged },
                    (None, Some(_)) => ResumeOutcome::AwaitingCallback,
                    (None, None) => ResumeOutcome::NothingPending,
                });
            }
        };

        let session =
            self.signer
                .complete(&record.session_id, &record.encoded_payload, callback_url)?;

        self.session_id = Some(record.session_id.clone());
        if session.status == SignatureStatus::Signed {
            self.draft = InscriptionDraft {
                raw_message: String::new(),
                encoded_payload: Some(record.encoded_payload),
                content_hash: Some(record.content_hash),
            };
        } else {
            self.draft.clear();
            store.clear()?;
        }
        Ok(ResumeOutcome::Signature(session.status))
    }

    /// Send every queued notification, oldest first. `None` when the queue
    /// was empty, otherwise whether all were acknowledged.
    async fn flush_deferred(&self) -> Result<Option<bool>, WorkflowError> {
        let queue = self.ctx.deferred_notifications();
        let mut all_acknowledged = None;
        for hash in queue.pending()? {
            let acknowledged = self.notify(&hash).await?;
            queue.remove(&hash)?;
            tracing::info!(tx_hash = %hash, acknowledged, "deferred indexer notification sent");
            all_acknowledged = Some(all_acknowledged.unwrap_or(true) && acknowledged);
        }
        Ok(all_acknowledged)
    }
}
