//! Wiring from configuration to workflow, and the subcommand handlers.

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use inscribe_crypto::{keypair_from_seed, parse_pem};
use inscribe_indexer::{IndexerClient, IndexerGateway, Inscription};
use inscribe_types::{Address, SignatureStatus, SigningMethod};
use inscribe_utils::{format_duration, format_timestamp};
use inscribe_wallet::{
    decrypt_keystore, encrypt_keystore, load_keystore, save_keystore, GatewaySubmitter, KeySigner,
    SigningGateway, TransactionSubmitter, WebWalletSigner,
};
use inscribe_workflow::{
    FileStorage, InscribeStage, NoticeLevel, Reconciler, ResumeOutcome, SubmitOutcome,
    WorkflowContext, WorkflowController, WorkflowSettings,
};
use tokio::time::Instant;

use crate::config::CliConfig;

pub struct App {
    config: CliConfig,
    password: Option<String>,
}

/// One account's workflow, ready to run.
struct Session {
    controller: WorkflowController,
    reconciler: Reconciler,
    submitter: Arc<GatewaySubmitter>,
    web_wallet: Option<Arc<WebWalletSigner>>,
}

impl App {
    pub fn new(config: CliConfig, password: Option<String>) -> Self {
        Self { config, password }
    }

    fn password(&self) -> anyhow::Result<&str> {
        self.password
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| anyhow!("keystore password required (--password or INSCRIBE_PASSWORD)"))
    }

    fn indexer(&self) -> anyhow::Result<Arc<dyn IndexerGateway>> {
        let client = IndexerClient::new(&self.config.indexer_url)?
            .with_auth_token(self.config.auth_token.clone());
        Ok(Arc::new(client))
    }

    fn open(&self) -> anyhow::Result<Session> {
        let keystore = load_keystore(&self.config.keystore)
            .with_context(|| format!("opening keystore {}", self.config.keystore.display()))?;
        let seed = decrypt_keystore(&keystore, self.password()?)?;
        let address = keystore.address.clone();

        let submitter = Arc::new(GatewaySubmitter::new(
            self.config.gateway_url(),
            keypair_from_seed(&seed),
        )?);
        let mut web_wallet = None;
        let signer: Arc<dyn SigningGateway> = match self.config.signing_method {
            SigningMethod::Keystore => Arc::new(KeySigner::new(keypair_from_seed(&seed))),
            SigningMethod::WebWallet => {
                let signer = Arc::new(WebWalletSigner::new(self.config.wallet_url())?);
                web_wallet = Some(signer.clone());
                signer
            }
            other => bail!("signing method {other} is not available from the command line"),
        };

        let storage = Arc::new(FileStorage::new(self.config.session_file()));
        let ctx = WorkflowContext::new(
            storage,
            address,
            self.config.signing_method,
            self.config.callback_url.clone(),
        );
        let settings = WorkflowSettings::new(self.config.environment.chain_id())
            .with_hash_authority(self.config.hash_authority)
            .with_confirmation_timeout(self.config.confirmation_timeout());
        let indexer = self.indexer()?;

        tracing::debug!(
            address = %ctx.address,
            method = %self.config.signing_method,
            hash_authority = %self.config.hash_authority,
            environment = %self.config.environment,
            "workflow opened"
        );
        Ok(Session {
            reconciler: Reconciler::new(&ctx, indexer.clone()),
            controller: WorkflowController::new(
                ctx,
                settings,
                indexer,
                signer,
                submitter.clone(),
            ),
            submitter,
            web_wallet,
        })
    }

    pub async fn account(&self) -> anyhow::Result<()> {
        let session = self.open()?;
        let address = session.controller.context().address.clone();
        let info = session.submitter.refresh_account(&address).await?;

        println!("Address:  {}", info.address);
        println!("Herotag:  {}", info.display_username().unwrap_or("N/A"));
        println!("Nonce:    {}", info.nonce);
        println!("Balance:  {}", info.balance);

        session.reconciler.mount().await?;
        print_inscriptions(&session.reconciler.inscriptions());
        Ok(())
    }

    pub async fn inscribe(&self, message: &str) -> anyhow::Result<()> {
        if self.config.signing_method.is_redirect() {
            bail!("web wallet signing is two-step: use `sign-url`, then `resume`");
        }
        let mut session = self.open()?;
        self.start(&mut session, message).await?;
        if !session.controller.is_success() {
            report(&mut session.controller);
            bail!("signature was not granted, try again");
        }
        self.submit_and_follow(&mut session).await
    }

    pub async fn sign_url(&self, message: &str) -> anyhow::Result<()> {
        if !self.config.signing_method.is_redirect() {
            bail!("sign-url needs signing_method = \"web-wallet\"");
        }
        let mut session = self.open()?;
        self.start(&mut session, message).await?;
        let url = session
            .web_wallet
            .as_ref()
            .and_then(|w| w.redirect_url())
            .ok_or_else(|| anyhow!("web wallet produced no signing URL"))?;

        println!("Open this URL to sign the inscription:");
        println!("{url}");
        println!("Then run `inscribe resume '<callback url>'` with the page it sends you to.");
        Ok(())
    }

    pub async fn resume(&self, callback_url: Option<&str>) -> anyhow::Result<()> {
        let mut session = self.open()?;
        match session.controller.resume(callback_url).await? {
            ResumeOutcome::NothingPending => println!("Nothing to resume."),
            ResumeOutcome::AwaitingCallback => {
                println!("A signature is pending: pass the callback URL the wallet redirected to.")
            }
            ResumeOutcome::Notified { acknowledged } => {
                announce_notified(acknowledged);
                session.reconciler.tick().await?;
                print_inscriptions(&session.reconciler.inscriptions());
            }
            ResumeOutcome::Signature(SignatureStatus::Signed) => {
                self.submit_and_follow(&mut session).await?;
            }
            ResumeOutcome::Signature(status) => {
                report(&mut session.controller);
                bail!("signature {status:?}, submit the message again");
            }
        }
        Ok(())
    }

    pub async fn watch(&self) -> anyhow::Result<()> {
        let indexer = self.indexer()?;
        let keystore = load_keystore(&self.config.keystore)
            .with_context(|| format!("opening keystore {}", self.config.keystore.display()))?;
        let ctx = WorkflowContext::new(
            Arc::new(FileStorage::new(self.config.session_file())),
            keystore.address,
            self.config.signing_method,
            self.config.callback_url.clone(),
        );

        let handle = Reconciler::new(&ctx, indexer).spawn(self.config.poll_interval());
        let mut inscriptions = handle.subscribe();
        tracing::info!(address = %ctx.address, interval_ms = self.config.poll_interval_ms, "watching inscriptions");

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                changed = inscriptions.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let list = inscriptions.borrow_and_update().clone();
                    print_inscriptions(&list);
                }
            }
        }

        tracing::info!("stopping watcher");
        handle.shutdown().await?;
        Ok(())
    }

    async fn start(&self, session: &mut Session, message: &str) -> anyhow::Result<()> {
        session.controller.set_message(message);
        match session.controller.submit(message).await? {
            SubmitOutcome::Ignored => bail!("message is blank"),
            SubmitOutcome::HashFailed | SubmitOutcome::SigningUnavailable => {
                report(&mut session.controller);
                bail!("inscription aborted");
            }
            SubmitOutcome::Started { session_id, status } => {
                tracing::info!(%session_id, ?status, "signing started");
                Ok(())
            }
        }
    }

    /// Submit the signed draft and follow it through confirmation and
    /// reconciliation.
    async fn submit_and_follow(&self, session: &mut Session) -> anyhow::Result<()> {
        let tracking_id = session.controller.inscribe().await?;
        println!("Inscription submitted (tracking {tracking_id}), waiting for confirmation...");

        let started = Instant::now();
        let mut ticker = tokio::time::interval(self.config.poll_interval());
        loop {
            ticker.tick().await;
            let Some(stage) = session.controller.poll_confirmation().await? else {
                bail!("no inscription is being tracked");
            };
            let deferred = session
                .controller
                .inscription()
                .is_some_and(|i| i.is_deferred());
            match stage {
                InscribeStage::MarkerSet => {
                    if let Err(e) = session.reconciler.tick().await {
                        tracing::warn!(error = %e, "refresh failed, retrying");
                    }
                }
                InscribeStage::Reconciled => break,
                InscribeStage::Notified => {
                    announce_notified(false);
                    break;
                }
                InscribeStage::Confirmed if deferred => {
                    if let ResumeOutcome::Notified { acknowledged } =
                        session.controller.resume(None).await?
                    {
                        announce_notified(acknowledged);
                        session.reconciler.tick().await?;
                    }
                    break;
                }
                InscribeStage::Failed | InscribeStage::TimedOut => {
                    report(&mut session.controller);
                    bail!("inscription did not complete");
                }
                InscribeStage::Submitted | InscribeStage::Confirmed => {}
            }
        }

        report(&mut session.controller);
        let elapsed = started.elapsed().as_secs();
        println!("Confirmed after {}.", format_duration(elapsed));
        print_inscriptions(&session.reconciler.inscriptions());
        Ok(())
    }
}

/// Convert a PEM wallet into an encrypted keystore at `out`.
pub fn import_pem(pem: &Path, out: &Path, password: &str) -> anyhow::Result<Address> {
    if password.is_empty() {
        bail!("keystore password required (--password or INSCRIBE_PASSWORD)");
    }
    let text =
        std::fs::read_to_string(pem).with_context(|| format!("reading {}", pem.display()))?;
    let (address, keypair) = parse_pem(&text)?;
    let keystore = encrypt_keystore(&address, &keypair.private.0, password)?;
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    save_keystore(&keystore, out)?;
    Ok(address)
}

fn announce_notified(acknowledged: bool) {
    if acknowledged {
        println!("Indexer notified.");
    } else {
        println!("The indexer did not acknowledge the inscription; it may appear later.");
    }
}

fn report(controller: &mut WorkflowController) {
    for notice in controller.take_notices() {
        match notice.level {
            NoticeLevel::Info => println!("{}", notice.text),
            NoticeLevel::Error => eprintln!("error: {}", notice.text),
        }
    }
}

fn print_inscriptions(list: &[Inscription]) {
    if list.is_empty() {
        println!("No inscriptions.");
        return;
    }
    println!("{} inscription(s):", list.len());
    for inscription in list {
        println!("{}", format_inscription(inscription));
    }
}

/// One listing entry: timestamp, hashes, parties, signature and the text.
fn format_inscription(inscription: &Inscription) -> String {
    let signature = match inscription.signature.as_str() {
        "" => "-",
        signature => signature,
    };
    format!(
        "  {}  {}  tx {}\n    creator {}\n    owner   {}\n    signature {}\n    {}",
        format_timestamp(inscription.timestamp.as_secs()),
        inscription.hash,
        inscription.tx_hash,
        inscription.creator,
        inscription.owner,
        signature,
        inscription.payload_text()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use inscribe_crypto::encode_pem;
    use inscribe_wallet::unlock_keystore;

    #[test]
    fn imports_pem_into_keystore() {
        let dir = tempfile::tempdir().unwrap();
        let keypair = keypair_from_seed(&[5u8; 32]);
        let address =
            Address::parse("erd1qyu5wthldzr8wx5c9ucg8kjagg0jfs53s8nr3zpz3hypefsdd8ssycr6th")
                .unwrap();
        let pem = dir.path().join("wallet.pem");
        std::fs::write(&pem, encode_pem(&address, &keypair)).unwrap();

        let out = dir.path().join("keys").join("keystore.json");
        assert_eq!(import_pem(&pem, &out, "secret").unwrap(), address);

        let unlocked = unlock_keystore(&load_keystore(&out).unwrap(), "secret").unwrap();
        assert_eq!(unlocked.public, keypair.public);
    }

    #[test]
    fn listing_shows_parties_and_signature() {
        let creator =
            Address::parse("erd1qyu5wthldzr8wx5c9ucg8kjagg0jfs53s8nr3zpz3hypefsdd8ssycr6th")
                .unwrap();
        let owner =
            Address::parse("erd1spyavw0956vq68xj8y4tenjpq2wd5a9p2c6j8gsz7ztyrnpxrruqzu66jx")
                .unwrap();
        let mut inscription = Inscription {
            hash: inscribe_types::ContentHash::parse("H1").unwrap(),
            tx_hash: inscribe_types::TxHash::parse(&"ab".repeat(32)).unwrap(),
            creator: creator.clone(),
            owner: owner.clone(),
            signature: "S1".into(),
            timestamp: inscribe_types::Timestamp::new(1_703_280_605),
            payload: inscribe_crypto::encode_payload(r#"{"a":1}"#),
        };

        let line = format_inscription(&inscription);
        assert!(line.contains(&format!("creator {creator}")));
        assert!(line.contains(&format!("owner   {owner}")));
        assert!(line.contains("signature S1"));
        assert!(line.contains(&"ab".repeat(32)));
        assert!(line.ends_with(r#"{"a":1}"#));

        inscription.signature.clear();
        assert!(format_inscription(&inscription).contains("signature -"));
    }

    #[test]
    fn import_requires_password() {
        let dir = tempfile::tempdir().unwrap();
        assert!(import_pem(&dir.path().join("none.pem"), &dir.path().join("k.json"), "").is_err());
    }
}
