//! Signing and tracking session identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{SignatureStatus, TypesError};

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident, $what:literal) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            pub fn new(raw: impl Into<String>) -> Result<Self, TypesError> {
                let raw = raw.into();
                if raw.trim().is_empty() {
                    return Err(TypesError::Empty($what));
                }
                Ok(Self(raw))
            }

            /// A fresh random identifier.
            pub fn random() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = TypesError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::new(s)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

opaque_id!(
    /// Identifies one message signature request inside a signing gateway.
    SessionId,
    "session id"
);

opaque_id!(
    /// Identifies a submitted transaction inside a submission gateway.
    TrackingId,
    "tracking id"
);

/// Gateway-owned record of a single signature request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureSession {
    pub session_id: SessionId,
    pub status: SignatureStatus,
    /// The payload that was (or is being) signed.
    pub message: Option<String>,
    /// Hex signature, present once `status` is `Signed`.
    pub signature: Option<String>,
}

impl SignatureSession {
    pub fn pending(session_id: SessionId, message: impl Into<String>) -> Self {
        Self {
            session_id,
            status: SignatureStatus::Pending,
            message: Some(message.into()),
            signature: None,
        }
    }

    /// Whether the session carries a non-empty message.
    pub fn has_message(&self) -> bool {
        self.message.as_deref().is_some_and(|m| !m.is_empty())
    }

    /// The signature, if signed with a non-empty value.
    pub fn signed_signature(&self) -> Option<&str> {
        match self.status {
            SignatureStatus::Signed => self.signature.as_deref().filter(|s| !s.is_empty()),
            _ => None,
        }
    }
}
