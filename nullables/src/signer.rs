//! Nullable signer: scripted signature outcomes.

use std::sync::Mutex;

use async_trait::async_trait;
use inscribe_types::{SessionId, SignatureSession, SignatureStatus, SigningMethod};
use inscribe_wallet::{SessionBook, SigningGateway, WalletError};

/// How the next `sign_message` call resolves.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SignOutcome {
    /// Resolve immediately as signed with this signature.
    Sign(String),
    Cancel,
    Fail,
    /// Leave the session pending, like a redirect wallet.
    Pending,
    /// The gateway itself errors before opening a session.
    Unavailable,
}

/// A signing gateway whose answers are scripted by the test.
pub struct NullSigner {
    method: SigningMethod,
    book: SessionBook,
    state: Mutex<State>,
}

struct State {
    outcome: SignOutcome,
    requests: Vec<(String, String)>,
    aborts: usize,
}

impl NullSigner {
    pub fn new(outcome: SignOutcome) -> Self {
        Self::with_method(SigningMethod::Extension, outcome)
    }

    pub fn with_method(method: SigningMethod, outcome: SignOutcome) -> Self {
        Self {
            method,
            book: SessionBook::new(),
            state: Mutex::new(State {
                outcome,
                requests: Vec::new(),
                aborts: 0,
            }),
        }
    }

    pub fn set_outcome(&self, outcome: SignOutcome) {
        self.state.lock().unwrap().outcome = outcome;
    }

    /// Resolve a session that was left pending.
    pub fn resolve(&self, id: &SessionId, status: SignatureStatus, signature: Option<&str>) {
        self.book.resolve(id, status, signature.map(str::to_string));
    }

    /// `(payload, callback_url)` for every `sign_message` call.
    pub fn requests(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn aborts(&self) -> usize {
        self.state.lock().unwrap().aborts
    }

    /// The session currently held as active, if any.
    pub fn active(&self) -> Option<SignatureSession> {
        self.book.active()
    }
}

#[async_trait]
impl SigningGateway for NullSigner {
    fn method(&self) -> SigningMethod {
        self.method
    }

    async fn sign_message(
        &self,
        payload: &str,
        callback_url: &str,
    ) -> Result<SessionId, WalletError> {
        let outcome = {
            let mut state = self.state.lock().unwrap();
            state
                .requests
                .push((payload.to_string(), callback_url.to_string()));
            state.outcome.clone()
        };
        if outcome == SignOutcome::Unavailable {
            return Err(WalletError::Signing("signer unavailable".into()));
        }

        let id = SessionId::random();
        self.book.open(SignatureSession::pending(id.clone(), payload));
        match outcome {
            SignOutcome::Sign(signature) => {
                self.book.resolve(&id, SignatureStatus::Signed, Some(signature));
            }
            SignOutcome::Cancel => {
                self.book.resolve(&id, SignatureStatus::Cancelled, None);
            }
            SignOutcome::Fail => {
                self.book.resolve(&id, SignatureStatus::Failed, None);
            }
            SignOutcome::Pending | SignOutcome::Unavailable => {}
        }
        Ok(id)
    }

    fn session(&self, id: &SessionId) -> Option<SignatureSession> {
        self.book.get(id)
    }

    fn abort(&self) {
        self.state.lock().unwrap().aborts += 1;
        self.book.discard_active();
    }
}
