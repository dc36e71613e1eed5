//! GatewaySubmitter against an in-process gateway.

use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use inscribe_crypto::keypair_from_seed;
use inscribe_types::Address;
use inscribe_wallet::{GatewaySubmitter, Transaction, TransactionStatus, TransactionSubmitter, WalletError};
use serde_json::{json, Value};

const ALICE: &str = "erd1qyu5wthldzr8wx5c9ucg8kjagg0jfs53s8nr3zpz3hypefsdd8ssycr6th";

#[derive(Clone, Default)]
struct Gateway {
    sent: Arc<Mutex<Vec<Value>>>,
}

async fn account(Path(address): Path<String>) -> Json<Value> {
    Json(json!({
        "data": { "account": { "address": address, "nonce": 7, "balance": "1000", "username": "alice.elrond" } },
        "error": "",
        "code": "successful"
    }))
}

async fn send(State(gw): State<Gateway>, Json(tx): Json<Value>) -> Json<Value> {
    gw.sent.lock().unwrap().push(tx);
    Json(json!({
        "data": { "txHash": "ab".repeat(32) },
        "error": "",
        "code": "successful"
    }))
}

async fn status(Path(hash): Path<String>) -> Json<Value> {
    assert_eq!(hash, "ab".repeat(32));
    Json(json!({ "data": { "status": "success" }, "error": "", "code": "successful" }))
}

async fn rejecting_send() -> Json<Value> {
    Json(json!({ "data": null, "error": "lowerNonceInTx: true", "code": "bad_request" }))
}

async fn serve(gw: Gateway) -> String {
    let app = Router::new()
        .route("/address/:address", get(account))
        .route("/transaction/send", post(send))
        .route("/transaction/:hash/status", get(status))
        .route("/rejecting/address/:address", get(account))
        .route("/rejecting/transaction/send", post(rejecting_send))
        .with_state(gw);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn inscribe_tx() -> Transaction {
    Transaction::self_transfer(Address::parse(ALICE).unwrap(), "inscribe@e30=@H1@S1".into(), 5_080_000, "D")
}

#[tokio::test]
async fn refresh_reads_nonce_and_username() {
    let base = serve(Gateway::default()).await;
    let submitter = GatewaySubmitter::new(&base, keypair_from_seed(&[1u8; 32])).unwrap();

    let info = submitter.refresh_account(&Address::parse(ALICE).unwrap()).await.unwrap();

    assert_eq!(info.nonce, 7);
    assert_eq!(info.balance, "1000");
    assert_eq!(info.display_username(), Some("alice"));
}

#[tokio::test]
async fn send_signs_with_refreshed_nonce_and_tracks() {
    let gw = Gateway::default();
    let base = serve(gw.clone()).await;
    let submitter = GatewaySubmitter::new(&base, keypair_from_seed(&[1u8; 32])).unwrap();
    let sender = Address::parse(ALICE).unwrap();

    submitter.refresh_account(&sender).await.unwrap();
    let first = submitter.send(inscribe_tx()).await.unwrap();
    submitter.send(inscribe_tx()).await.unwrap();

    let sent = gw.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0]["nonce"], 7);
    assert_eq!(sent[1]["nonce"], 8);
    assert_eq!(sent[0]["chainID"], "D");
    assert_eq!(sent[0]["receiver"], ALICE);
    assert_eq!(sent[0]["signature"].as_str().unwrap().len(), 128);

    let tracked = submitter.status(&first).await.unwrap();
    assert_eq!(tracked.status, TransactionStatus::Successful);
    assert_eq!(tracked.hash.unwrap().as_str(), "ab".repeat(32));
}

#[tokio::test]
async fn send_without_refresh_fetches_nonce() {
    let gw = Gateway::default();
    let base = serve(gw.clone()).await;
    let submitter = GatewaySubmitter::new(&base, keypair_from_seed(&[1u8; 32])).unwrap();

    submitter.send(inscribe_tx()).await.unwrap();

    assert_eq!(gw.sent.lock().unwrap()[0]["nonce"], 7);
}

#[tokio::test]
async fn gateway_error_is_surfaced() {
    let base = serve(Gateway::default()).await;
    let submitter =
        GatewaySubmitter::new(format!("{base}/rejecting"), keypair_from_seed(&[1u8; 32])).unwrap();

    let err = submitter.send(inscribe_tx()).await.unwrap_err();
    match err {
        WalletError::Gateway(message) => assert!(message.contains("lowerNonceInTx")),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn unknown_tracking_id() {
    let submitter = GatewaySubmitter::new("http://127.0.0.1:9", keypair_from_seed(&[1u8; 32])).unwrap();
    let id = inscribe_types::TrackingId::random();
    assert!(matches!(
        submitter.status(&id).await,
        Err(WalletError::UnknownTracking(_))
    ));
}
