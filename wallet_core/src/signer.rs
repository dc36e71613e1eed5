//! Message signing gateway port and the in-page key signer.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use inscribe_crypto::sign_personal_message;
use inscribe_types::{KeyPair, SessionId, SignatureSession, SignatureStatus, SigningMethod};

use crate::WalletError;

/// A wallet capability that signs off-chain messages.
///
/// The gateway owns its sessions. Callers hold only the [`SessionId`] and
/// must cope with the session disappearing (after [`abort`](Self::abort))
/// or never resolving (the user walked away from a redirect).
#[async_trait]
pub trait SigningGateway: Send + Sync {
    fn method(&self) -> SigningMethod;

    /// Start signing `payload`. Redirect wallets come back on `callback_url`.
    async fn sign_message(&self, payload: &str, callback_url: &str)
        -> Result<SessionId, WalletError>;

    fn session(&self, id: &SessionId) -> Option<SignatureSession>;

    /// Resolve session `id` from the URL a redirect wallet sent the user back
    /// to. `message` re-opens the session if this gateway never saw it.
    fn complete(
        &self,
        id: &SessionId,
        message: &str,
        callback_url: &str,
    ) -> Result<SignatureSession, WalletError> {
        let _ = (message, callback_url);
        Err(WalletError::Callback(format!(
            "{} signing has no callback to complete session {id}",
            self.method().as_str()
        )))
    }

    /// Discard the active session, cancelling it if still pending. Idempotent.
    fn abort(&self);
}

/// Session bookkeeping shared by signer implementations.
///
/// At most one session is active; opening a new one replaces it.
#[derive(Default)]
pub struct SessionBook {
    inner: Mutex<BookState>,
}

#[derive(Default)]
struct BookState {
    sessions: HashMap<SessionId, SignatureSession>,
    active: Option<SessionId>,
}

impl SessionBook {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BookState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record `session` and make it the active one.
    pub fn open(&self, session: SignatureSession) {
        let mut state = self.lock();
        if let Some(previous) = state.active.take() {
            state.sessions.remove(&previous);
        }
        state.active = Some(session.session_id.clone());
        state.sessions.insert(session.session_id.clone(), session);
    }

    pub fn get(&self, id: &SessionId) -> Option<SignatureSession> {
        self.lock().sessions.get(id).cloned()
    }

    pub fn active(&self) -> Option<SignatureSession> {
        let state = self.lock();
        state.active.as_ref().and_then(|id| state.sessions.get(id).cloned())
    }

    /// Move a session to `status`. Terminal sessions are not reopened.
    pub fn resolve(
        &self,
        id: &SessionId,
        status: SignatureStatus,
        signature: Option<String>,
    ) -> Option<SignatureSession> {
        let mut state = self.lock();
        let session = state.sessions.get_mut(id)?;
        if !session.status.is_terminal() {
            session.status = status;
            session.signature = signature;
        }
        Some(session.clone())
    }

    /// Forget the active session. Returns it as it was when discarded.
    pub fn discard_active(&self) -> Option<SignatureSession> {
        let mut state = self.lock();
        let id = state.active.take()?;
        let mut session = state.sessions.remove(&id)?;
        if session.status == SignatureStatus::Pending {
            session.status = SignatureStatus::Cancelled;
        }
        Some(session)
    }
}

/// In-page signer holding the account key locally.
///
/// Resolves synchronously: by the time `sign_message` returns, the session
/// is already `Signed`.
pub struct KeySigner {
    keypair: KeyPair,
    book: SessionBook,
}

impl KeySigner {
    pub fn new(keypair: KeyPair) -> Self {
        Self {
            keypair,
            book: SessionBook::new(),
        }
    }
}

#[async_trait]
impl SigningGateway for KeySigner {
    fn method(&self) -> SigningMethod {
        SigningMethod::Keystore
    }

    async fn sign_message(
        &self,
        payload: &str,
        _callback_url: &str,
    ) -> Result<SessionId, WalletError> {
        if payload.is_empty() {
            return Err(WalletError::Signing("refusing to sign an empty payload".into()));
        }

        let session_id = SessionId::random();
        self.book
            .open(SignatureSession::pending(session_id.clone(), payload));

        let signature = sign_personal_message(payload.as_bytes(), &self.keypair.private);
        self.book
            .resolve(&session_id, SignatureStatus::Signed, Some(signature.to_hex()));

        tracing::debug!(%session_id, "message signed in-page");
        Ok(session_id)
    }

    fn session(&self, id: &SessionId) -> Option<SignatureSession> {
        self.book.get(id)
    }

    fn abort(&self) {
        if let Some(session) = self.book.discard_active() {
            tracing::debug!(session_id = %session.session_id, "signing session discarded");
        }
    }
}
