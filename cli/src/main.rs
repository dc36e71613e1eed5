//! inscribe: sign, inscribe and browse on-chain inscriptions.

mod app;
mod config;

use std::path::PathBuf;

use clap::Parser;
use inscribe_types::{Environment, SigningMethod};
use inscribe_utils::LogFormat;
use inscribe_workflow::HashAuthority;

use crate::app::App;
use crate::config::{CliConfig, Overrides};

#[derive(Parser)]
#[command(name = "inscribe", about = "Inscribe messages on-chain and browse inscriptions")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "INSCRIBE_CONFIG")]
    config: Option<PathBuf>,

    /// Chain environment: "devnet", "testnet" or "mainnet".
    #[arg(long, env = "INSCRIBE_ENVIRONMENT")]
    environment: Option<Environment>,

    /// Indexer service base URL.
    #[arg(long, env = "INSCRIBE_INDEXER_URL")]
    indexer_url: Option<String>,

    /// Chain gateway base URL.
    #[arg(long, env = "INSCRIBE_GATEWAY_URL")]
    gateway_url: Option<String>,

    /// Web wallet base URL (web-wallet signing).
    #[arg(long, env = "INSCRIBE_WALLET_URL")]
    wallet_url: Option<String>,

    /// Bearer token for the indexer.
    #[arg(long, env = "INSCRIBE_AUTH_TOKEN", hide_env_values = true)]
    auth_token: Option<String>,

    /// Encrypted keystore file.
    #[arg(long, env = "INSCRIBE_KEYSTORE")]
    keystore: Option<PathBuf>,

    /// Keystore password.
    #[arg(long, env = "INSCRIBE_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Signing method: "keystore" or "web-wallet".
    #[arg(long, env = "INSCRIBE_SIGNING_METHOD")]
    signing_method: Option<SigningMethod>,

    /// Content hash source: "indexer" or "local".
    #[arg(long, env = "INSCRIBE_HASH_AUTHORITY")]
    hash_authority: Option<HashAuthority>,

    /// Directory for session state.
    #[arg(long, env = "INSCRIBE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "INSCRIBE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "INSCRIBE_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Show the account and its inscriptions.
    Account,

    /// Sign and inscribe a message with the keystore key.
    Inscribe { message: String },

    /// Start a web wallet signature and print the URL to open.
    #[command(name = "sign-url")]
    SignUrl { message: String },

    /// Continue after the web wallet redirected back, or send a deferred
    /// indexer notification.
    Resume { callback_url: Option<String> },

    /// Keep the inscription list up to date until Ctrl-C.
    Watch,

    /// Convert a PEM wallet into an encrypted keystore.
    #[command(name = "import-pem")]
    ImportPem {
        pem: PathBuf,

        /// Output file (defaults to the configured keystore path).
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            environment: self.environment,
            indexer_url: self.indexer_url.clone(),
            gateway_url: self.gateway_url.clone(),
            wallet_url: self.wallet_url.clone(),
            auth_token: self.auth_token.clone(),
            keystore: self.keystore.clone(),
            signing_method: self.signing_method,
            hash_authority: self.hash_authority,
            data_dir: self.data_dir.clone(),
            log_format: self.log_format,
            log_level: self.log_level.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => CliConfig::from_toml_file(path)?,
        None => CliConfig::default(),
    }
    .apply(cli.overrides());

    inscribe_utils::init_logging(config.log_format, &config.log_level);
    if let Some(path) = &cli.config {
        tracing::info!("loaded config from {}", path.display());
    }

    match cli.command {
        Command::Account => App::new(config, cli.password).account().await,
        Command::Inscribe { message } => App::new(config, cli.password).inscribe(&message).await,
        Command::SignUrl { message } => App::new(config, cli.password).sign_url(&message).await,
        Command::Resume { callback_url } => {
            App::new(config, cli.password)
                .resume(callback_url.as_deref())
                .await
        }
        Command::Watch => App::new(config, cli.password).watch().await,
        Command::ImportPem { pem, out } => {
            let out = out.unwrap_or_else(|| config.keystore.clone());
            let address = app::import_pem(&pem, &out, cli.password.as_deref().unwrap_or(""))?;
            println!("Keystore for {address} written to {}", out.display());
            Ok(())
        }
    }
}
