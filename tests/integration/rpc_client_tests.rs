//! Solana RPC client tests against a local JSON-RPC mock

use mockito::{Matcher, Mock, ServerGuard};
use serde_json::{json, Value};
use solana_sdk::{pubkey::Pubkey, signature::Signature};
use std::time::{Duration, Instant};

use solswap::config::RpcConfig;
use solswap::engine::rpc::{ChainRpc, SolanaRpc};
use solswap::error::AppError;

use crate::support::unsigned_versioned;

fn rpc(url: &str, confirm_timeout_secs: u64) -> SolanaRpc {
    SolanaRpc::new(&RpcConfig {
        endpoint: url.to_string(),
        timeout_ms: 2_000,
        confirm_timeout_secs,
        ..Default::default()
    })
}

async fn answer(server: &mut ServerGuard, method: &str, result: Value) -> Mock {
    server
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({ "method": method })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "jsonrpc": "2.0", "result": result, "id": 1 }).to_string())
        .create_async()
        .await
}

fn instruction_error() -> Value {
    json!({ "InstructionError": [0, { "Custom": 1 }] })
}

#[tokio::test]
async fn test_confirm_reports_on_chain_failure() {
    let mut server = mockito::Server::new_async().await;
    let _statuses = answer(
        &mut server,
        "getSignatureStatuses",
        json!({
            "context": { "slot": 1 },
            "value": [{
                "slot": 1,
                "confirmations": null,
                "err": instruction_error(),
                "status": { "Err": instruction_error() },
                "confirmationStatus": "confirmed"
            }]
        }),
    )
    .await;

    let err = rpc(&server.url(), 5)
        .confirm(&Signature::default())
        .await
        .unwrap_err();

    match err {
        AppError::Confirmation(msg) => {
            assert!(msg.contains("failed on-chain"), "{}", msg);
            assert!(msg.contains("custom program error: 0x1"), "{}", msg);
        }
        other => panic!("expected confirmation error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_confirm_succeeds_once_status_is_confirmed() {
    let mut server = mockito::Server::new_async().await;
    let _statuses = answer(
        &mut server,
        "getSignatureStatuses",
        json!({
            "context": { "slot": 1 },
            "value": [{
                "slot": 1,
                "confirmations": 3,
                "err": null,
                "status": { "Ok": null },
                "confirmationStatus": "confirmed"
            }]
        }),
    )
    .await;

    assert!(rpc(&server.url(), 5)
        .confirm(&Signature::default())
        .await
        .is_ok());
}

#[tokio::test]
async fn test_confirm_times_out_when_signature_unknown() {
    let mut server = mockito::Server::new_async().await;
    let statuses = server
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({ "method": "getSignatureStatuses" })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "jsonrpc": "2.0",
                "result": { "context": { "slot": 1 }, "value": [null] },
                "id": 1
            })
            .to_string(),
        )
        .expect_at_least(1)
        .create_async()
        .await;

    let started = Instant::now();
    let err = rpc(&server.url(), 1)
        .confirm(&Signature::default())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Timeout(_)), "{:?}", err);
    assert!(started.elapsed() >= Duration::from_secs(1));
    assert!(started.elapsed() < Duration::from_secs(5));
    statuses.assert_async().await;
}

#[tokio::test]
async fn test_simulation_error_and_logs() {
    let mut server = mockito::Server::new_async().await;
    let _simulate = answer(
        &mut server,
        "simulateTransaction",
        json!({
            "context": { "slot": 1 },
            "value": {
                "err": instruction_error(),
                "logs": [
                    "Program JUP6LkbZbjS1jKKwapdHNy74zcZ3tLUZoi5QNyVTaV4 invoke [1]",
                    "Program log: slippage tolerance exceeded"
                ],
                "accounts": null,
                "unitsConsumed": 48213,
                "returnData": null
            }
        }),
    )
    .await;

    let transaction = unsigned_versioned(&Pubkey::new_unique());
    let report = rpc(&server.url(), 5).simulate(&transaction).await.unwrap();

    assert!(report.err.as_deref().unwrap_or_default().contains("Custom(1)"));
    assert_eq!(report.logs.len(), 2);
    assert_eq!(report.logs[1], "Program log: slippage tolerance exceeded");
    assert_eq!(report.units_consumed, Some(48_213));
}

#[tokio::test]
async fn test_balance_http_error_is_wrapped_once() {
    let mut server = mockito::Server::new_async().await;
    let _balance = server
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({ "method": "getBalance" })))
        .with_status(500)
        .with_body("internal error")
        .create_async()
        .await;

    let err = rpc(&server.url(), 5)
        .get_balance(&Pubkey::new_unique())
        .await
        .unwrap_err();

    assert!(err.is_retryable());
    match &err {
        AppError::Rpc(msg) => assert!(msg.starts_with("getBalance failed"), "{}", msg),
        other => panic!("expected RPC error, got {:?}", other),
    }
    assert!(!err.to_string().contains("RPC error: RPC error"));
}

#[tokio::test]
async fn test_concurrent_balance_reads_share_one_request() {
    let mut server = mockito::Server::new_async().await;
    let balance = server
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({ "method": "getBalance" })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "jsonrpc": "2.0",
                "result": { "context": { "slot": 1 }, "value": 25_000_000u64 },
                "id": 1
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let client = rpc(&server.url(), 5);
    let owner = Pubkey::new_unique();
    let (a, b) = tokio::join!(client.get_balance(&owner), client.get_balance(&owner));

    assert_eq!(a.unwrap(), 25_000_000);
    assert_eq!(b.unwrap(), 25_000_000);
    balance.assert_async().await;
}

#[tokio::test]
async fn test_health_reads_balance_and_slot() {
    let mut server = mockito::Server::new_async().await;
    let _balance = answer(
        &mut server,
        "getBalance",
        json!({ "context": { "slot": 1 }, "value": 12_000_000u64 }),
    )
    .await;
    let _slot = answer(&mut server, "getSlot", json!(250_000_000u64)).await;

    let health = rpc(&server.url(), 5)
        .health(&Pubkey::new_unique())
        .await
        .unwrap();

    assert_eq!(health.balance_lamports, 12_000_000);
    assert_eq!(health.slot, 250_000_000);
}
