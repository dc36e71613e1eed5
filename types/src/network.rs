//! Network environment and chain identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// Which chain environment the dashboard talks to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Devnet,
    Testnet,
    Mainnet,
}

impl Environment {
    /// Chain identifier carried in every transaction.
    pub fn chain_id(&self) -> &'static str {
        match self {
            Self::Devnet => "D",
            Self::Testnet => "T",
            Self::Mainnet => "1",
        }
    }

    /// Default public gateway (proxy) URL.
    pub fn default_gateway_url(&self) -> &'static str {
        match self {
            Self::Devnet => "https://devnet-gateway.multiversx.com",
            Self::Testnet => "https://testnet-gateway.multiversx.com",
            Self::Mainnet => "https://gateway.multiversx.com",
        }
    }

    /// Default web wallet URL used for redirect signing.
    pub fn default_wallet_url(&self) -> &'static str {
        match self {
            Self::Devnet => "https://devnet-wallet.multiversx.com",
            Self::Testnet => "https://testnet-wallet.multiversx.com",
            Self::Mainnet => "https://wallet.multiversx.com",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Devnet => "devnet",
            Self::Testnet => "testnet",
            Self::Mainnet => "mainnet",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "devnet" | "dev" => Ok(Self::Devnet),
            "testnet" | "test" => Ok(Self::Testnet),
            "mainnet" | "main" => Ok(Self::Mainnet),
            other => Err(TypesError::Unknown {
                kind: "environment",
                value: other.to_string(),
            }),
        }
    }
}
