//! CLI configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use inscribe_types::{Environment, SigningMethod};
use inscribe_utils::LogFormat;
use inscribe_workflow::HashAuthority;
use thiserror::Error;

const DEFAULT_INDEXER_URL: &str = "https://inscriptions-indexer-bucurdavid.koyeb.app";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Configuration for the `inscribe` binary.
///
/// Loaded from a TOML file via [`CliConfig::from_toml_file`]; flags and
/// `INSCRIBE_*` environment variables are applied on top with
/// [`CliConfig::apply`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Chain environment: "devnet", "testnet" or "mainnet".
    #[serde(default)]
    pub environment: Environment,

    #[serde(default = "default_indexer_url")]
    pub indexer_url: String,

    /// Chain gateway; defaults to the environment's public gateway.
    #[serde(default)]
    pub gateway_url: Option<String>,

    /// Web wallet for redirect signing; defaults to the environment's wallet.
    #[serde(default)]
    pub wallet_url: Option<String>,

    /// Bearer token for the indexer.
    #[serde(default)]
    pub auth_token: Option<String>,

    /// Encrypted keystore holding the account key.
    #[serde(default = "default_keystore")]
    pub keystore: PathBuf,

    #[serde(default)]
    pub signing_method: SigningMethod,

    #[serde(default)]
    pub hash_authority: HashAuthority,

    /// Where the web wallet sends the user back after signing.
    #[serde(default = "default_callback_url")]
    pub callback_url: String,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// How long a submitted transaction may stay unconfirmed.
    #[serde(default = "default_confirmation_timeout_secs")]
    pub confirmation_timeout_secs: u64,

    /// Holds the session file (markers and resume records).
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Values given on the command line or through the environment.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub environment: Option<Environment>,
    pub indexer_url: Option<String>,
    pub gateway_url: Option<String>,
    pub wallet_url: Option<String>,
    pub auth_token: Option<String>,
    pub keystore: Option<PathBuf>,
    pub signing_method: Option<SigningMethod>,
    pub hash_authority: Option<HashAuthority>,
    pub data_dir: Option<PathBuf>,
    pub log_format: Option<LogFormat>,
    pub log_level: Option<String>,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_indexer_url() -> String {
    DEFAULT_INDEXER_URL.to_string()
}

fn default_keystore() -> PathBuf {
    PathBuf::from("./inscribe_data/keystore.json")
}

fn default_callback_url() -> String {
    "http://localhost:3000/dashboard".to_string()
}

fn default_poll_interval_ms() -> u64 {
    1_000
}

fn default_confirmation_timeout_secs() -> u64 {
    120
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./inscribe_data")
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl CliConfig {
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn apply(mut self, overrides: Overrides) -> Self {
        if let Some(environment) = overrides.environment {
            self.environment = environment;
        }
        if let Some(url) = overrides.indexer_url {
            self.indexer_url = url;
        }
        self.gateway_url = overrides.gateway_url.or(self.gateway_url);
        self.wallet_url = overrides.wallet_url.or(self.wallet_url);
        self.auth_token = overrides
            .auth_token
            .or(self.auth_token)
            .filter(|t| !t.is_empty());
        if let Some(keystore) = overrides.keystore {
            self.keystore = keystore;
        }
        if let Some(method) = overrides.signing_method {
            self.signing_method = method;
        }
        if let Some(authority) = overrides.hash_authority {
            self.hash_authority = authority;
        }
        if let Some(dir) = overrides.data_dir {
            self.data_dir = dir;
        }
        if let Some(format) = overrides.log_format {
            self.log_format = format;
        }
        if let Some(level) = overrides.log_level {
            self.log_level = level;
        }
        self
    }

    pub fn gateway_url(&self) -> &str {
        self.gateway_url
            .as_deref()
            .unwrap_or(self.environment.default_gateway_url())
    }

    pub fn wallet_url(&self) -> &str {
        self.wallet_url
            .as_deref()
            .unwrap_or(self.environment.default_wallet_url())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }

    pub fn session_file(&self) -> PathBuf {
        self.data_dir.join("session.json")
    }
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            indexer_url: default_indexer_url(),
            gateway_url: None,
            wallet_url: None,
            auth_token: None,
            keystore: default_keystore(),
            signing_method: SigningMethod::default(),
            hash_authority: HashAuthority::default(),
            callback_url: default_callback_url(),
            poll_interval_ms: default_poll_interval_ms(),
            confirmation_timeout_secs: default_confirmation_timeout_secs(),
            data_dir: default_data_dir(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
        }
    }
}
