//! Signing status and signing method enums.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// Lifecycle of a message signature request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureStatus {
    /// Waiting on the wallet (possibly on another page).
    Pending,
    /// The wallet returned a signature.
    Signed,
    /// The user rejected the request.
    Cancelled,
    /// The wallet reported an error.
    Failed,
}

impl SignatureStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Terminal states that call for a "try again" affordance.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Failed)
    }
}

impl FromStr for SignatureStatus {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "signed" => Ok(Self::Signed),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            "failed" => Ok(Self::Failed),
            other => Err(TypesError::Unknown {
                kind: "signature status",
                value: other.to_string(),
            }),
        }
    }
}

/// How the user logged in, which decides how signatures are obtained.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SigningMethod {
    /// Browser extension provider.
    Extension,
    /// Hardware wallet.
    Ledger,
    /// Mobile wallet over a relay.
    WalletConnect,
    /// Local encrypted keystore or PEM file.
    #[default]
    Keystore,
    /// Hosted web wallet: signing navigates away and comes back on a callback URL.
    WebWallet,
}

impl SigningMethod {
    /// Whether signing leaves the current page and resumes on a callback.
    pub fn is_redirect(&self) -> bool {
        matches!(self, Self::WebWallet)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Extension => "extension",
            Self::Ledger => "ledger",
            Self::WalletConnect => "wallet-connect",
            Self::Keystore => "keystore",
            Self::WebWallet => "web-wallet",
        }
    }
}

impl fmt::Display for SigningMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SigningMethod {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "extension" => Ok(Self::Extension),
            "ledger" => Ok(Self::Ledger),
            "wallet-connect" | "walletconnect" => Ok(Self::WalletConnect),
            "keystore" | "pem" => Ok(Self::Keystore),
            "web-wallet" | "wallet" => Ok(Self::WebWallet),
            other => Err(TypesError::Unknown {
                kind: "signing method",
                value: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_pending_is_non_terminal() {
        assert!(!SignatureStatus::Pending.is_terminal());
        assert!(SignatureStatus::Signed.is_terminal());
        assert!(SignatureStatus::Cancelled.is_terminal());
        assert!(SignatureStatus::Failed.is_terminal());
    }

    #[test]
    fn signed_is_not_a_rejection() {
        assert!(!SignatureStatus::Signed.is_rejection());
        assert!(SignatureStatus::Cancelled.is_rejection());
        assert!(SignatureStatus::Failed.is_rejection());
    }

    #[test]
    fn only_web_wallet_redirects() {
        for method in [
            SigningMethod::Extension,
            SigningMethod::Ledger,
            SigningMethod::WalletConnect,
            SigningMethod::Keystore,
        ] {
            assert!(!method.is_redirect(), "{method} should sign in-page");
        }
        assert!(SigningMethod::WebWallet.is_redirect());
    }

    #[test]
    fn method_string_roundtrip() {
        for method in [
            SigningMethod::Extension,
            SigningMethod::Ledger,
            SigningMethod::WalletConnect,
            SigningMethod::Keystore,
            SigningMethod::WebWallet,
        ] {
            assert_eq!(method.as_str().parse::<SigningMethod>().unwrap(), method);
        }
    }
}
