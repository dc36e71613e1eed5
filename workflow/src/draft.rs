//! Session state: the draft being inscribed and the notices raised for it.

use inscribe_types::ContentHash;

/// The message being inscribed and what has been derived from it so far.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InscriptionDraft {
    pub raw_message: String,
    pub encoded_payload: Option<String>,
    pub content_hash: Option<ContentHash>,
}

impl InscriptionDraft {
    /// Encoded payload and content hash, once both are present.
    pub fn ready(&self) -> Option<(&str, &ContentHash)> {
        let payload = self.encoded_payload.as_deref().filter(|p| !p.is_empty())?;
        Some((payload, self.content_hash.as_ref()?))
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A transient user-visible message (a toast, in the dashboard).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}
