use std::sync::Arc;
use std::time::Duration;

use inscribe_indexer::Inscription;
use inscribe_nullables::submitter::NULL_TX_HASH;
use inscribe_nullables::NullIndexer;
use inscribe_types::{Address, ContentHash, SigningMethod, Timestamp, TxHash};
use inscribe_workflow::{MemoryStorage, Reconciler, SessionStorage, WorkflowContext};

const ALICE: &str = "erd1qyu5wthldzr8wx5c9ucg8kjagg0jfs53s8nr3zpz3hypefsdd8ssycr6th";
const BOB: &str = "erd1spyavw0956vq68xj8y4tenjpq2wd5a9p2c6j8gsz7ztyrnpxrruqzu66jx";

fn context(storage: &Arc<MemoryStorage>, address: &str) -> WorkflowContext {
    WorkflowContext::new(
        storage.clone(),
        Address::parse(address).unwrap(),
        SigningMethod::Extension,
        "http://localhost:3000/dashboard",
    )
}

fn inscription(owner: &str) -> Inscription {
    let owner = Address::parse(owner).unwrap();
    Inscription {
        hash: ContentHash::parse("H1").unwrap(),
        tx_hash: TxHash::parse(NULL_TX_HASH).unwrap(),
        creator: owner.clone(),
        owner,
        signature: "S1".into(),
        timestamp: Timestamp::new(1_703_280_605),
        payload: "eyJhIjoxfQ==".into(),
    }
}

fn tx_hash() -> TxHash {
    TxHash::parse(NULL_TX_HASH).unwrap()
}

fn setup() -> (Arc<MemoryStorage>, Arc<NullIndexer>, WorkflowContext, Reconciler) {
    let storage = Arc::new(MemoryStorage::new());
    let indexer = Arc::new(NullIndexer::new("H1"));
    indexer.add_inscription(inscription(ALICE));
    let ctx = context(&storage, ALICE);
    let reconciler = Reconciler::new(&ctx, indexer.clone());
    (storage, indexer, ctx, reconciler)
}

#[tokio::test]
async fn mount_refreshes_without_marker() {
    let (_, indexer, _, reconciler) = setup();
    let rx = reconciler.subscribe();

    reconciler.mount().await.unwrap();

    assert_eq!(indexer.list_calls(), 1);
    assert_eq!(rx.borrow().len(), 1);
    assert_eq!(reconciler.inscriptions()[0].payload_text(), r#"{"a":1}"#);
}

#[tokio::test]
async fn mount_with_marker_fetches_once_and_clears() {
    let (_, indexer, ctx, reconciler) = setup();
    ctx.markers().set(&tx_hash()).unwrap();

    reconciler.mount().await.unwrap();

    assert_eq!(indexer.list_calls(), 1);
    assert!(!ctx.markers().is_set().unwrap());
}

#[tokio::test]
async fn marker_triggers_exactly_one_refetch() {
    let (_, indexer, ctx, reconciler) = setup();
    assert!(!reconciler.tick().await.unwrap());
    assert_eq!(indexer.list_calls(), 0);

    ctx.markers().set(&tx_hash()).unwrap();
    assert!(reconciler.tick().await.unwrap());
    assert_eq!(indexer.list_calls(), 1);
    assert!(!ctx.markers().is_set().unwrap());

    assert!(!reconciler.tick().await.unwrap());
    assert_eq!(indexer.list_calls(), 1);
}

#[tokio::test]
async fn failed_refresh_keeps_marker() {
    let (_, indexer, ctx, reconciler) = setup();
    ctx.markers().set(&tx_hash()).unwrap();
    indexer.fail_listings(1);

    assert!(reconciler.tick().await.is_err());
    assert!(ctx.markers().is_set().unwrap());

    assert!(reconciler.tick().await.unwrap());
    assert!(!ctx.markers().is_set().unwrap());
    assert_eq!(indexer.list_calls(), 2);
}

#[tokio::test]
async fn teardown_clears_marker() {
    let (_, _, ctx, reconciler) = setup();
    ctx.markers().set(&tx_hash()).unwrap();
    reconciler.teardown().unwrap();
    assert!(!ctx.markers().is_set().unwrap());
    reconciler.teardown().unwrap();
}

#[tokio::test]
async fn markers_of_other_accounts_are_untouched() {
    let (storage, indexer, _, reconciler) = setup();
    let bob = context(&storage, BOB);
    bob.markers().set(&tx_hash()).unwrap();

    assert!(!reconciler.tick().await.unwrap());
    reconciler.teardown().unwrap();

    assert!(bob.markers().is_set().unwrap());
    assert_eq!(indexer.list_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn spawned_reconciler_polls_on_interval() {
    let (storage, indexer, ctx, reconciler) = setup();
    let handle = reconciler.spawn(Duration::from_secs(1));

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(indexer.list_calls(), 1);

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(indexer.list_calls(), 1);

    ctx.markers().set(&tx_hash()).unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(indexer.list_calls(), 2);
    assert!(!ctx.markers().is_set().unwrap());

    ctx.markers().set(&tx_hash()).unwrap();
    handle.shutdown().await.unwrap();
    assert!(storage.get(ctx.markers().key()).unwrap().is_none());

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(indexer.list_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn dropping_handle_stops_polling() {
    let (_, indexer, ctx, reconciler) = setup();
    let handle = reconciler.spawn(Duration::from_secs(1));
    tokio::time::sleep(Duration::from_millis(10)).await;

    ctx.markers().set(&tx_hash()).unwrap();
    drop(handle);
    assert!(!ctx.markers().is_set().unwrap());

    ctx.markers().set(&tx_hash()).unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(indexer.list_calls(), 1);
    assert!(ctx.markers().is_set().unwrap());
}

#[tokio::test(start_paused = true)]
async fn handle_publishes_refreshed_list() {
    let (_, indexer, ctx, reconciler) = setup();
    let handle = reconciler.spawn(Duration::from_secs(1));
    let mut rx = handle.subscribe();

    rx.changed().await.unwrap();
    assert_eq!(rx.borrow_and_update().len(), 1);

    indexer.add_inscription(inscription(ALICE));
    ctx.markers().set(&tx_hash()).unwrap();
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow().len(), 2);

    handle.shutdown().await.unwrap();
}
