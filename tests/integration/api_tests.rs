//! HTTP API tests
//!
//! Drives the router through axum-test with a scripted swap service.

use async_trait::async_trait;
use axum::http::StatusCode;
use axum_test::TestServer;
use parking_lot::Mutex;
use serde_json::{json, Value};
use solana_sdk::{pubkey::Pubkey, signature::Keypair};
use std::sync::Arc;

use solswap::engine::executor::{SwapFailure, SwapOutcome};
use solswap::engine::priority_fee::PriorityFee;
use solswap::error::AppError;
use solswap::handlers::{router, SwapParams, SwapService, SwapState};
use solswap::metrics::MetricsState;
use solswap::wallet::encode_private_key;

/// Returns a prepared result and records what it was asked to do
struct ScriptedSwapService {
    result: Mutex<Option<Result<SwapOutcome, SwapFailure>>>,
    calls: Mutex<Vec<(Option<String>, Option<u16>, Option<String>)>>,
}

impl ScriptedSwapService {
    fn new(result: Result<SwapOutcome, SwapFailure>) -> Arc<Self> {
        Arc::new(Self {
            result: Mutex::new(Some(result)),
            calls: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl SwapService for ScriptedSwapService {
    async fn swap(&self, params: SwapParams) -> Result<SwapOutcome, SwapFailure> {
        self.calls
            .lock()
            .push((params.fee_recipient, params.fee_bps, params.rpc_endpoint));
        self.result
            .lock()
            .take()
            .unwrap_or_else(|| Err(failure(AppError::Internal("called twice".into()))))
    }
}

fn outcome() -> SwapOutcome {
    SwapOutcome {
        signature: "5sig".to_string(),
        logs: vec!["Quote: ok".to_string(), "Confirmed 5sig".to_string()],
        in_amount: 10_000_000,
        out_amount: 1_500_000,
        slippage_bps: 50,
        priority_fee: PriorityFee::MicroLamports(10_000),
        units_consumed: Some(100_000),
        simulated_only: false,
    }
}

fn failure(error: AppError) -> SwapFailure {
    SwapFailure {
        error,
        logs: vec!["Balance 1 lamports at slot 42".to_string()],
    }
}

fn server(service: Arc<ScriptedSwapService>) -> (TestServer, Arc<MetricsState>) {
    let metrics = Arc::new(MetricsState::new());
    let state = Arc::new(SwapState {
        service,
        metrics: metrics.clone(),
    });
    (TestServer::new(router(state, metrics.clone())).unwrap(), metrics)
}

fn private_key() -> String {
    encode_private_key(&Keypair::new())
}

#[tokio::test]
async fn test_swap_success() {
    let service = ScriptedSwapService::new(Ok(outcome()));
    let (server, metrics) = server(service.clone());
    let recipient = Pubkey::new_unique().to_string();

    let response = server
        .post("/swap")
        .json(&json!({
            "privateKey": private_key(),
            "feeRecipient": recipient,
            "feeBps": 25,
            "rpcEndpoint": "https://rpc.example.com"
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["signature"], "5sig");
    assert_eq!(body["logs"].as_array().unwrap().len(), 2);

    let calls = service.calls.lock();
    assert_eq!(
        calls[0],
        (
            Some(recipient),
            Some(25),
            Some("https://rpc.example.com".to_string())
        )
    );
    assert_eq!(metrics.swaps_total.with_label_values(&["success"]).get(), 1);
    assert_eq!(metrics.priority_fee.get(), 10_000);
}

#[tokio::test]
async fn test_swap_rejects_short_private_key() {
    let service = ScriptedSwapService::new(Ok(outcome()));
    let (server, _) = server(service.clone());

    let short = bs58::encode([7u8; 32]).into_string();
    let response = server
        .post("/swap")
        .json(&json!({ "privateKey": short }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["reason"], "validation_failed");
    assert!(service.calls.lock().is_empty());
}

#[tokio::test]
async fn test_swap_rejects_fee_bps_out_of_range() {
    let service = ScriptedSwapService::new(Ok(outcome()));
    let (server, _) = server(service.clone());

    for bps in [-1, 10_001] {
        let response = server
            .post("/swap")
            .json(&json!({ "privateKey": private_key(), "feeBps": bps }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }
    assert!(service.calls.lock().is_empty());
}

#[tokio::test]
async fn test_swap_rejects_missing_private_key() {
    let service = ScriptedSwapService::new(Ok(outcome()));
    let (server, _) = server(service);

    let response = server.post("/swap").json(&json!({ "feeBps": 10 })).await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_swap_failure_status_mapping() {
    let cases = [
        (AppError::Http("Jupiter quote returned 503".into()), StatusCode::BAD_GATEWAY),
        (AppError::Rpc("getBalance failed".into()), StatusCode::BAD_GATEWAY),
        (
            AppError::Simulation("InstructionError".into()),
            StatusCode::UNPROCESSABLE_ENTITY,
        ),
        (
            AppError::Timeout("not confirmed".into()),
            StatusCode::GATEWAY_TIMEOUT,
        ),
        (
            AppError::InsufficientBalance {
                required: 15_000_000,
                available: 1,
            },
            StatusCode::BAD_REQUEST,
        ),
        (AppError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
    ];

    for (error, expected) in cases {
        let reason = error.reason();
        let service = ScriptedSwapService::new(Err(failure(error)));
        let (server, _) = server(service);

        let response = server
            .post("/swap")
            .json(&json!({ "privateKey": private_key() }))
            .await;

        response.assert_status(expected);
        let body: Value = response.json();
        assert_eq!(body["reason"], reason);
        assert_eq!(body["logs"][0], "Balance 1 lamports at slot 42");
    }
}

#[tokio::test]
async fn test_health_and_metrics() {
    let (server, metrics) = server(ScriptedSwapService::new(Ok(outcome())));
    metrics.observe_swap("success", 800.0);

    let health = server.get("/health").await;
    health.assert_status_ok();
    let body: Value = health.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));

    let scrape = server.get("/metrics").await;
    scrape.assert_status_ok();
    assert!(scrape.text().contains("solswap_swaps_total"));
}
