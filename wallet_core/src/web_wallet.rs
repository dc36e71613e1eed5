//! Redirect-style signing through the hosted web wallet.
//!
//! Signing navigates to the wallet's sign-message hook. The wallet redirects
//! back to the callback URL with `status` and `signature` query parameters,
//! typically in a fresh page (or, for the CLI, a fresh process), so the
//! session may have to be re-created from persisted state before it can be
//! completed.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use inscribe_types::{SessionId, SignatureSession, SignatureStatus, SigningMethod};
use url::Url;

use crate::{SessionBook, SigningGateway, WalletError};

pub struct WebWalletSigner {
    wallet_url: String,
    book: SessionBook,
    redirect: Mutex<Option<Url>>,
}

impl WebWalletSigner {
    pub fn new(wallet_url: &str) -> Result<Self, WalletError> {
        // validate early; the hook URL is built from this string
        Url::parse(wallet_url)?;
        Ok(Self {
            wallet_url: wallet_url.trim_end_matches('/').to_string(),
            book: SessionBook::new(),
            redirect: Mutex::new(None),
        })
    }

    /// The wallet page the user must visit to sign `payload`.
    pub fn hook_url(&self, payload: &str, callback_url: &str) -> Result<Url, WalletError> {
        Url::parse(callback_url)?;
        Ok(Url::parse_with_params(
            &format!("{}/hook/sign-message", self.wallet_url),
            &[("message", payload), ("callbackUrl", callback_url)],
        )?)
    }

    /// Where the last `sign_message` call wants the user to go.
    pub fn redirect_url(&self) -> Option<Url> {
        self.redirect
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Extract the terminal status and signature from a callback URL.
fn parse_callback(callback_url: &str) -> Result<(SignatureStatus, Option<String>), WalletError> {
    let url = Url::parse(callback_url)?;
    let mut status = None;
    let mut signature = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "status" => status = Some(value.into_owned()),
            "signature" => signature = Some(value.into_owned()).filter(|s| !s.is_empty()),
            _ => {}
        }
    }

    let status = match status.as_deref() {
        None => SignatureStatus::Cancelled,
        Some(raw) => raw.parse::<SignatureStatus>()?,
    };
    match (status, signature) {
        (SignatureStatus::Pending, _) => Err(WalletError::Callback(
            "wallet redirected back without resolving the signature".into(),
        )),
        (SignatureStatus::Signed, None) => Ok((SignatureStatus::Failed, None)),
        (SignatureStatus::Signed, Some(sig)) => Ok((SignatureStatus::Signed, Some(sig))),
        (other, _) => Ok((other, None)),
    }
}

#[async_trait]
impl SigningGateway for WebWalletSigner {
    fn method(&self) -> SigningMethod {
        SigningMethod::WebWallet
    }

    async fn sign_message(
        &self,
        payload: &str,
        callback_url: &str,
    ) -> Result<SessionId, WalletError> {
        let url = self.hook_url(payload, callback_url)?;
        let session_id = SessionId::random();
        self.book
            .open(SignatureSession::pending(session_id.clone(), payload));
        *self.redirect.lock().unwrap_or_else(PoisonError::into_inner) = Some(url);

        tracing::debug!(%session_id, "awaiting web wallet redirect");
        Ok(session_id)
    }

    fn session(&self, id: &SessionId) -> Option<SignatureSession> {
        self.book.get(id)
    }

    /// When the session is unknown to this signer (the page was reloaded),
    /// it is re-opened from `message` first.
    fn complete(
        &self,
        session_id: &SessionId,
        message: &str,
        callback_url: &str,
    ) -> Result<SignatureSession, WalletError> {
        let (status, signature) = parse_callback(callback_url)?;

        if self.book.get(session_id).is_none() {
            self.book
                .open(SignatureSession::pending(session_id.clone(), message));
        }
        let session = self
            .book
            .resolve(session_id, status, signature)
            .ok_or_else(|| WalletError::Callback(format!("session {session_id} vanished")))?;

        tracing::info!(%session_id, status = ?session.status, "web wallet signature resolved");
        Ok(session)
    }

    fn abort(&self) {
        self.book.discard_active();
        self.redirect
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}
