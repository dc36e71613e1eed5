use std::sync::Arc;
use std::time::Duration;

use inscribe_crypto::content_hash;
use inscribe_nullables::submitter::NULL_TX_HASH;
use inscribe_nullables::{NullIndexer, NullSigner, NullSubmitter, SignOutcome};
use inscribe_types::{Address, SignatureStatus, SigningMethod, TxHash};
use inscribe_wallet::{TransactionStatus, WebWalletSigner};
use inscribe_workflow::{
    HashAuthority, InscribeStage, MemoryStorage, Notice, Reconciler, ResumeOutcome,
    SessionStorage, SubmitOutcome, ViewState, WorkflowContext, WorkflowController, WorkflowError,
    WorkflowSettings,
};

const ALICE: &str = "erd1qyu5wthldzr8wx5c9ucg8kjagg0jfs53s8nr3zpz3hypefsdd8ssycr6th";
const CALLBACK: &str = "http://localhost:3000/dashboard";
const WALLET: &str = "https://devnet-wallet.multiversx.com";
const MESSAGE: &str = r#"{"a":1}"#;
const ENCODED: &str = "eyJhIjoxfQ==";

struct Harness {
    controller: WorkflowController,
    storage: Arc<MemoryStorage>,
    indexer: Arc<NullIndexer>,
    signer: Arc<NullSigner>,
    submitter: Arc<NullSubmitter>,
}

fn alice() -> Address {
    Address::parse(ALICE).unwrap()
}

fn context(storage: &Arc<MemoryStorage>, method: SigningMethod) -> WorkflowContext {
    WorkflowContext::new(storage.clone(), alice(), method, CALLBACK)
}

fn harness_with(outcome: SignOutcome, settings: WorkflowSettings) -> Harness {
    let storage = Arc::new(MemoryStorage::new());
    let indexer = Arc::new(NullIndexer::new("H1"));
    let signer = Arc::new(NullSigner::new(outcome));
    let submitter = Arc::new(NullSubmitter::new());
    let controller = WorkflowController::new(
        context(&storage, SigningMethod::Extension),
        settings,
        indexer.clone(),
        signer.clone(),
        submitter.clone(),
    );
    Harness {
        controller,
        storage,
        indexer,
        signer,
        submitter,
    }
}

fn harness(outcome: SignOutcome) -> Harness {
    harness_with(outcome, WorkflowSettings::new("D"))
}

fn marker_key() -> String {
    format!("inscription:{ALICE}")
}

#[tokio::test]
async fn signed_message_builds_inscribe_transaction() {
    let mut h = harness(SignOutcome::Sign("S1".into()));
    h.controller.set_message(MESSAGE);

    let outcome = h.controller.submit(MESSAGE).await.unwrap();
    assert!(matches!(
        outcome,
        SubmitOutcome::Started {
            status: SignatureStatus::Signed,
            ..
        }
    ));
    assert!(h.controller.is_success());
    assert!(!h.controller.is_error());
    assert_eq!(h.controller.draft().raw_message, "");
    assert_eq!(h.indexer.generated(), vec![ENCODED]);
    assert_eq!(h.signer.requests(), vec![(ENCODED.to_string(), CALLBACK.to_string())]);

    h.controller.inscribe().await.unwrap();

    let sent = h.submitter.sent();
    assert_eq!(sent.len(), 1);
    let tx = &sent[0];
    assert_eq!(tx.data, format!("inscribe@{ENCODED}@H1@S1"));
    assert_eq!(tx.sender, alice());
    assert_eq!(tx.receiver, alice());
    assert_eq!(tx.value, "0");
    assert_eq!(tx.chain_id, "D");
    assert_eq!(tx.gas_limit, 50_000 + 1_500 * ENCODED.len() as u64 + 5_000_000);
    assert_eq!(h.submitter.events(), vec!["refresh", "send"]);
}

#[tokio::test]
async fn cancelled_signature_shows_error_and_builds_nothing() {
    let mut h = harness(SignOutcome::Cancel);

    h.controller.submit(MESSAGE).await.unwrap();
    assert_eq!(h.controller.view(), ViewState::Error);
    assert!(!h.controller.is_success());

    assert!(matches!(
        h.controller.inscribe().await,
        Err(WorkflowError::NotReady("signature"))
    ));
    assert!(h.submitter.sent().is_empty());
    assert_eq!(h.submitter.refresh_calls(), 0);
}

#[tokio::test]
async fn failed_signature_shows_error() {
    let mut h = harness(SignOutcome::Fail);
    h.controller.submit(MESSAGE).await.unwrap();
    assert!(h.controller.is_error());
}

#[tokio::test]
async fn pending_signature_awaits() {
    let mut h = harness(SignOutcome::Pending);
    h.controller.submit(MESSAGE).await.unwrap();
    assert_eq!(h.controller.view(), ViewState::AwaitingSignature);
    assert!(h.controller.inscribe().await.is_err());

    let id = h.signer.active().unwrap().session_id;
    h.signer.resolve(&id, SignatureStatus::Signed, Some("S1"));
    assert!(h.controller.is_success());
    h.controller.inscribe().await.unwrap();
}

#[tokio::test]
async fn indexer_failure_stops_before_signing() {
    let mut h = harness(SignOutcome::Sign("S1".into()));
    h.indexer.fail_generate(500, Some("payload rejected"));

    let outcome = h.controller.submit(MESSAGE).await.unwrap();
    assert_eq!(outcome, SubmitOutcome::HashFailed);
    assert!(h.signer.requests().is_empty());
    assert_eq!(h.controller.view(), ViewState::Idle);
    assert_eq!(
        h.controller.take_notices(),
        vec![Notice::error(
            "Error generating inscription hash: payload rejected"
        )]
    );
    assert!(h.controller.take_notices().is_empty());
}

#[tokio::test]
async fn indexer_failure_without_message() {
    let mut h = harness(SignOutcome::Sign("S1".into()));
    h.indexer.fail_generate(502, None);

    h.controller.submit(MESSAGE).await.unwrap();
    assert_eq!(
        h.controller.take_notices(),
        vec![Notice::error("Error generating hash for inscription")]
    );
}

#[tokio::test]
async fn unavailable_signer_is_a_notice() {
    let mut h = harness(SignOutcome::Unavailable);
    assert_eq!(
        h.controller.submit(MESSAGE).await.unwrap(),
        SubmitOutcome::SigningUnavailable
    );
    assert_eq!(h.controller.take_notices().len(), 1);
    assert_eq!(h.controller.view(), ViewState::Idle);
}

#[tokio::test]
async fn blank_submit_touches_nothing() {
    let mut h = harness(SignOutcome::Sign("S1".into()));
    h.controller.set_message("  ");

    assert_eq!(h.controller.submit(" \n\t").await.unwrap(), SubmitOutcome::Ignored);
    assert_eq!(h.indexer.calls(), 0);
    assert!(h.signer.requests().is_empty());
    assert_eq!(h.signer.aborts(), 0);
    assert_eq!(h.controller.draft().raw_message, "  ");
}

#[tokio::test]
async fn submit_aborts_previous_session() {
    let mut h = harness(SignOutcome::Pending);
    h.controller.submit("first").await.unwrap();
    let first = h.signer.active().unwrap().session_id;

    h.controller.submit("second").await.unwrap();
    assert_eq!(h.signer.aborts(), 1);
    assert!(h.controller.signature_session().unwrap().session_id != first);
}

#[tokio::test]
async fn abort_is_idempotent() {
    let mut h = harness(SignOutcome::Pending);
    h.controller.submit(MESSAGE).await.unwrap();

    h.controller.abort();
    let view = h.controller.view();
    let draft = h.controller.draft().clone();
    h.controller.abort();

    assert_eq!(view, ViewState::Idle);
    assert_eq!(h.controller.view(), view);
    assert_eq!(h.controller.draft(), &draft);
    assert_eq!(h.signer.aborts(), 1);
}

#[tokio::test]
async fn local_hash_authority_skips_indexer() {
    let mut h = harness_with(
        SignOutcome::Sign("S1".into()),
        WorkflowSettings::new("D").with_hash_authority(HashAuthority::Local),
    );

    h.controller.submit(MESSAGE).await.unwrap();
    h.controller.inscribe().await.unwrap();

    assert_eq!(h.indexer.calls(), 0);
    let expected = content_hash(ENCODED);
    assert_eq!(
        h.submitter.sent()[0].data,
        format!("inscribe@{ENCODED}@{expected}@S1")
    );
}

#[tokio::test]
async fn submission_failure_keeps_draft_for_retry() {
    let mut h = harness(SignOutcome::Sign("S1".into()));
    h.controller.submit(MESSAGE).await.unwrap();

    h.submitter.fail_refresh(Some("gateway down"));
    assert!(matches!(
        h.controller.inscribe().await,
        Err(WorkflowError::Wallet(_))
    ));
    assert!(h.controller.draft().ready().is_some());
    assert!(h.controller.is_success());

    h.submitter.fail_refresh(None);
    h.controller.inscribe().await.unwrap();

    // the draft is consumed
    assert!(matches!(
        h.controller.inscribe().await,
        Err(WorkflowError::NotReady(_))
    ));
    assert_eq!(h.submitter.sent().len(), 1);
}

#[tokio::test]
async fn confirmation_notifies_indexer_and_reconciles() {
    let mut h = harness(SignOutcome::Sign("S1".into()));
    h.submitter
        .script_statuses([TransactionStatus::Pending, TransactionStatus::Successful]);

    assert_eq!(h.controller.poll_confirmation().await.unwrap(), None);

    h.controller.submit(MESSAGE).await.unwrap();
    h.controller.inscribe().await.unwrap();

    assert_eq!(
        h.controller.poll_confirmation().await.unwrap(),
        Some(InscribeStage::Submitted)
    );
    assert_eq!(
        h.controller.poll_confirmation().await.unwrap(),
        Some(InscribeStage::MarkerSet)
    );
    assert_eq!(h.indexer.processed(), vec![TxHash::parse(NULL_TX_HASH).unwrap()]);
    assert!(h.storage.get(&marker_key()).unwrap().is_some());

    // still waiting on the reconciler
    assert_eq!(
        h.controller.poll_confirmation().await.unwrap(),
        Some(InscribeStage::MarkerSet)
    );

    let reconciler = Reconciler::new(h.controller.context(), h.indexer.clone());
    assert!(reconciler.tick().await.unwrap());

    assert_eq!(
        h.controller.poll_confirmation().await.unwrap(),
        Some(InscribeStage::Reconciled)
    );
    assert_eq!(h.indexer.processed().len(), 1);
    assert_eq!(
        h.controller.take_notices(),
        vec![Notice::info("Inscription recorded")]
    );
}

#[tokio::test]
async fn unacknowledged_process_sets_no_marker() {
    let mut h = harness(SignOutcome::Sign("S1".into()));
    h.indexer.acknowledge_process(false);
    h.submitter.script_statuses([TransactionStatus::Successful]);

    h.controller.submit(MESSAGE).await.unwrap();
    h.controller.inscribe().await.unwrap();

    assert_eq!(
        h.controller.poll_confirmation().await.unwrap(),
        Some(InscribeStage::Notified)
    );
    assert!(h.storage.get(&marker_key()).unwrap().is_none());
}

#[tokio::test]
async fn chain_failure_is_terminal() {
    let mut h = harness(SignOutcome::Sign("S1".into()));
    h.submitter.script_statuses([TransactionStatus::Failed]);

    h.controller.submit(MESSAGE).await.unwrap();
    h.controller.inscribe().await.unwrap();

    assert_eq!(
        h.controller.poll_confirmation().await.unwrap(),
        Some(InscribeStage::Failed)
    );
    assert!(h.indexer.processed().is_empty());
    assert_eq!(h.controller.take_notices().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn unconfirmed_transaction_times_out() {
    let mut h = harness_with(
        SignOutcome::Sign("S1".into()),
        WorkflowSettings::new("D").with_confirmation_timeout(Duration::from_secs(30)),
    );

    h.controller.submit(MESSAGE).await.unwrap();
    h.controller.inscribe().await.unwrap();
    assert_eq!(
        h.controller.poll_confirmation().await.unwrap(),
        Some(InscribeStage::Submitted)
    );

    tokio::time::advance(Duration::from_secs(31)).await;
    assert_eq!(
        h.controller.poll_confirmation().await.unwrap(),
        Some(InscribeStage::TimedOut)
    );
    let calls = h.submitter.status_calls();
    h.controller.poll_confirmation().await.unwrap();
    assert_eq!(h.submitter.status_calls(), calls);
}

fn web_wallet_controller(
    storage: &Arc<MemoryStorage>,
    indexer: &Arc<NullIndexer>,
    submitter: &Arc<NullSubmitter>,
) -> WorkflowController {
    WorkflowController::new(
        context(storage, SigningMethod::WebWallet),
        WorkflowSettings::new("D"),
        indexer.clone(),
        Arc::new(WebWalletSigner::new(WALLET).unwrap()),
        submitter.clone(),
    )
}

#[tokio::test]
async fn redirect_wallet_resumes_after_reload() {
    let storage = Arc::new(MemoryStorage::new());
    let indexer = Arc::new(NullIndexer::new("H1"));
    let submitter = Arc::new(NullSubmitter::new());
    submitter.script_statuses([TransactionStatus::Successful]);

    let mut before = web_wallet_controller(&storage, &indexer, &submitter);
    before.submit(MESSAGE).await.unwrap();
    assert_eq!(before.view(), ViewState::AwaitingSignature);
    drop(before);

    // the page reloads on the callback
    let mut after = web_wallet_controller(&storage, &indexer, &submitter);
    assert_eq!(after.resume(None).await.unwrap(), ResumeOutcome::AwaitingCallback);
    let outcome = after
        .resume(Some(&format!("{CALLBACK}?status=signed&signature=S1")))
        .await
        .unwrap();
    assert_eq!(outcome, ResumeOutcome::Signature(SignatureStatus::Signed));
    assert!(after.is_success());

    after.inscribe().await.unwrap();
    assert_eq!(submitter.sent()[0].data, format!("inscribe@{ENCODED}@H1@S1"));

    // confirmation is recorded, notification deferred
    assert_eq!(
        after.poll_confirmation().await.unwrap(),
        Some(InscribeStage::Confirmed)
    );
    assert!(after.inscription().unwrap().is_deferred());
    assert!(indexer.processed().is_empty());

    let mut next_run = web_wallet_controller(&storage, &indexer, &submitter);
    assert_eq!(
        next_run.resume(None).await.unwrap(),
        ResumeOutcome::Notified { acknowledged: true }
    );
    assert_eq!(indexer.processed(), vec![TxHash::parse(NULL_TX_HASH).unwrap()]);
    assert!(storage.get(&marker_key()).unwrap().is_some());
    assert_eq!(next_run.resume(None).await.unwrap(), ResumeOutcome::NothingPending);
}

#[tokio::test]
async fn redirect_wallet_cancellation_discards_draft() {
    let storage = Arc::new(MemoryStorage::new());
    let indexer = Arc::new(NullIndexer::new("H1"));
    let submitter = Arc::new(NullSubmitter::new());

    let mut before = web_wallet_controller(&storage, &indexer, &submitter);
    before.submit(MESSAGE).await.unwrap();

    let mut after = web_wallet_controller(&storage, &indexer, &submitter);
    let outcome = after
        .resume(Some(&format!("{CALLBACK}?status=cancelled")))
        .await
        .unwrap();
    assert_eq!(outcome, ResumeOutcome::Signature(SignatureStatus::Cancelled));
    assert!(after.is_error());
    assert!(after.inscribe().await.is_err());
    assert_eq!(after.resume(None).await.unwrap(), ResumeOutcome::NothingPending);
    assert!(submitter.sent().is_empty());
}

#[tokio::test]
async fn abort_drops_redirect_draft() {
    let storage = Arc::new(MemoryStorage::new());
    let indexer = Arc::new(NullIndexer::new("H1"));
    let submitter = Arc::new(NullSubmitter::new());

    let mut controller = web_wallet_controller(&storage, &indexer, &submitter);
    controller.submit(MESSAGE).await.unwrap();
    assert!(!storage.is_empty());

    controller.abort();
    assert!(storage.is_empty());
    assert_eq!(controller.resume(None).await.unwrap(), ResumeOutcome::NothingPending);
}

/// Run one redirect inscription up to its deferred confirmation.
async fn confirm_with_deferred_notification(
    storage: &Arc<MemoryStorage>,
    indexer: &Arc<NullIndexer>,
    submitter: &Arc<NullSubmitter>,
) -> WorkflowController {
    submitter.script_statuses([TransactionStatus::Successful]);
    let mut controller = web_wallet_controller(storage, indexer, submitter);
    controller.submit(MESSAGE).await.unwrap();
    controller
        .resume(Some(&format!("{CALLBACK}?status=signed&signature=S1")))
        .await
        .unwrap();
    controller.inscribe().await.unwrap();
    assert_eq!(
        controller.poll_confirmation().await.unwrap(),
        Some(InscribeStage::Confirmed)
    );
    assert!(indexer.processed().is_empty());
    controller
}

#[tokio::test]
async fn deferred_notification_survives_next_submission() {
    let storage = Arc::new(MemoryStorage::new());
    let indexer = Arc::new(NullIndexer::new("H1"));
    let submitter = Arc::new(NullSubmitter::new());

    let mut controller = confirm_with_deferred_notification(&storage, &indexer, &submitter).await;
    controller.submit("second").await.unwrap();
    controller.abort();
    controller.submit("second").await.unwrap();
    assert_eq!(controller.view(), ViewState::AwaitingSignature);

    let mut next_run = web_wallet_controller(&storage, &indexer, &submitter);
    assert_eq!(
        next_run.resume(None).await.unwrap(),
        ResumeOutcome::Notified { acknowledged: true }
    );
    assert_eq!(indexer.processed(), vec![TxHash::parse(NULL_TX_HASH).unwrap()]);
    assert!(storage.get(&marker_key()).unwrap().is_some());

    // the second draft is still waiting for its callback
    assert_eq!(next_run.resume(None).await.unwrap(), ResumeOutcome::AwaitingCallback);
    assert_eq!(indexer.processed().len(), 1);
}

#[tokio::test]
async fn callback_completes_alongside_deferred_notification() {
    let storage = Arc::new(MemoryStorage::new());
    let indexer = Arc::new(NullIndexer::new("H1"));
    let submitter = Arc::new(NullSubmitter::new());

    let mut controller = confirm_with_deferred_notification(&storage, &indexer, &submitter).await;
    controller.submit("second").await.unwrap();

    let mut next_run = web_wallet_controller(&storage, &indexer, &submitter);
    let outcome = next_run
        .resume(Some(&format!("{CALLBACK}?status=signed&signature=S2")))
        .await
        .unwrap();
    assert_eq!(outcome, ResumeOutcome::Signature(SignatureStatus::Signed));
    assert_eq!(indexer.processed(), vec![TxHash::parse(NULL_TX_HASH).unwrap()]);

    next_run.inscribe().await.unwrap();
    assert_eq!(submitter.sent()[1].data, "inscribe@c2Vjb25k@H1@S2");
    assert_eq!(next_run.resume(None).await.unwrap(), ResumeOutcome::NothingPending);
}

#[tokio::test]
async fn signer_decides_redirect_handling() {
    let storage = Arc::new(MemoryStorage::new());
    let indexer = Arc::new(NullIndexer::new("H1"));
    let submitter = Arc::new(NullSubmitter::new());
    let mut controller = WorkflowController::new(
        context(&storage, SigningMethod::Extension),
        WorkflowSettings::new("D"),
        indexer.clone(),
        Arc::new(WebWalletSigner::new(WALLET).unwrap()),
        submitter.clone(),
    );
    assert_eq!(controller.context().signing_method, SigningMethod::WebWallet);

    controller.submit(MESSAGE).await.unwrap();
    assert!(!storage.is_empty());
    assert_eq!(controller.resume(None).await.unwrap(), ResumeOutcome::AwaitingCallback);
}
