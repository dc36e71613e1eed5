//! Account state as reported by the chain gateway.

use inscribe_types::Address;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub address: Address,
    /// Next nonce the account must use.
    pub nonce: u64,
    /// Balance in the smallest denomination, as a decimal string.
    pub balance: String,
    /// Herotag, if the account registered one.
    #[serde(default)]
    pub username: Option<String>,
}

impl AccountInfo {
    /// Username without the `.elrond` suffix the chain stores.
    pub fn display_username(&self) -> Option<&str> {
        self.username
            .as_deref()
            .filter(|u| !u.is_empty())
            .map(|u| u.strip_suffix(".elrond").unwrap_or(u))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(username: Option<&str>) -> AccountInfo {
        AccountInfo {
            address: Address::parse(
                "erd1qyu5wthldzr8wx5c9ucg8kjagg0jfs53s8nr3zpz3hypefsdd8ssycr6th",
            )
            .unwrap(),
            nonce: 0,
            balance: "0".into(),
            username: username.map(str::to_string),
        }
    }

    #[test]
    fn username_suffix_is_stripped() {
        assert_eq!(info(Some("alice.elrond")).display_username(), Some("alice"));
        assert_eq!(info(Some("bob")).display_username(), Some("bob"));
        assert_eq!(info(Some("")).display_username(), None);
        assert_eq!(info(None).display_username(), None);
    }
}
