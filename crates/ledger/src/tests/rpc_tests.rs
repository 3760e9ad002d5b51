use super::*;
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use std::collections::HashMap;
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone, Default)]
struct NodeState {
    responses: Arc<Mutex<HashMap<String, Value>>>,
    seen: Arc<Mutex<Vec<Value>>>,
}

async fn handle(
    State(state): State<NodeState>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    state.seen.lock().await.push(body.clone());
    let method = body["method"].as_str().unwrap_or_default().to_string();
    let responses = state.responses.lock().await;
    let Some(reply) = responses.get(&method) else {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    };
    let mut reply = reply.clone();
    reply["jsonrpc"] = json!("2.0");
    reply["id"] = body["id"].clone();
    Ok(Json(reply))
}

async fn spawn_node(responses: Vec<(&str, Value)>) -> (JsonRpcClient, NodeState) {
    let state = NodeState::default();
    {
        let mut guard = state.responses.lock().await;
        for (method, reply) in responses {
            guard.insert(method.to_string(), reply);
        }
    }
    let app = Router::new()
        .route("/", post(handle))
        .with_state(state.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    (JsonRpcClient::new(format!("http://{addr}/")), state)
}

#[tokio::test]
async fn request_accounts_parses_addresses() {
    let (client, state) = spawn_node(vec![(
        "eth_requestAccounts",
        json!({ "result": ["0x00000000000000000000000000000000000000aa"] }),
    )])
    .await;

    let accounts = client.request_accounts().await.expect("accounts");
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].0[19], 0xaa);

    let seen = state.seen.lock().await;
    assert_eq!(seen[0]["jsonrpc"], "2.0");
    assert_eq!(seen[0]["method"], "eth_requestAccounts");
}

#[tokio::test]
async fn user_rejection_code_maps_to_user_rejected() {
    let (client, _) = spawn_node(vec![(
        "eth_sendTransaction",
        json!({ "error": { "code": 4001, "message": "User denied transaction signature" } }),
    )])
    .await;

    let err = client
        .send_transaction(Address([1; 20]), Address([2; 20]), &[0xde, 0xad])
        .await
        .expect_err("rejected");
    assert!(matches!(err, LedgerError::UserRejected(_)));
}

#[tokio::test]
async fn other_error_codes_map_to_rpc_error() {
    let (client, _) = spawn_node(vec![(
        "eth_call",
        json!({ "error": { "code": 3, "message": "execution reverted" } }),
    )])
    .await;

    let err = client
        .call(Address([1; 20]), Address([2; 20]), &[0x01])
        .await
        .expect_err("reverted");
    assert!(matches!(err, LedgerError::Rpc { code: 3, .. }));
}

#[tokio::test]
async fn call_sends_hex_data_and_decodes_result() {
    let (client, state) = spawn_node(vec![("eth_call", json!({ "result": "0x0102" }))]).await;

    let out = client
        .call(Address([1; 20]), Address([2; 20]), &[0xab, 0xcd])
        .await
        .expect("call");
    assert_eq!(out, vec![1, 2]);

    let seen = state.seen.lock().await;
    assert_eq!(seen[0]["params"][0]["data"], "0xabcd");
    assert_eq!(seen[0]["params"][1], "latest");
}

#[tokio::test]
async fn pending_receipt_is_none() {
    let (client, _) = spawn_node(vec![(
        "eth_getTransactionReceipt",
        json!({ "result": null }),
    )])
    .await;

    let receipt = client
        .transaction_receipt(&TxHash("0xabc".into()))
        .await
        .expect("receipt");
    assert!(receipt.is_none());
}

#[tokio::test]
async fn http_failure_is_transport_error() {
    let (client, _) = spawn_node(Vec::new()).await;

    let err = client
        .request::<Value>("eth_blockNumber", json!([]))
        .await
        .expect_err("server error");
    assert!(matches!(err, LedgerError::Transport(_)));
}

#[test]
fn receipt_status_and_block_number() {
    let ok: TransactionReceipt = serde_json::from_value(json!({
        "transactionHash": "0x01",
        "blockNumber": "0x10",
        "status": "0x1"
    }))
    .expect("receipt");
    assert!(ok.succeeded());
    assert_eq!(ok.block_number(), Some(16));

    let failed: TransactionReceipt = serde_json::from_value(json!({
        "transactionHash": "0x02",
        "status": "0x0"
    }))
    .expect("receipt");
    assert!(!failed.succeeded());
    assert_eq!(failed.block_number(), None);
}

#[test]
fn quantity_requires_prefix() {
    assert_eq!(parse_quantity("0xff").expect("quantity"), 255);
    assert!(matches!(parse_quantity("ff"), Err(LedgerError::Decode(_))));
}
