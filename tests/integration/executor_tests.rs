//! Swap orchestration tests against scripted Jupiter and RPC stand-ins

use solana_sdk::{pubkey::Pubkey, signature::Keypair};
use std::sync::Arc;

use solswap::config::{AppConfig, PriorityFeeMode};
use solswap::engine::priority_fee::PriorityFee;
use solswap::error::AppError;

use crate::support::{config_with_mode, test_executor, FakeRpc, FakeSwapApi};

const FUNDED: u64 = 1_000_000_000;

#[tokio::test]
async fn test_swap_happy_path() {
    let config = AppConfig::default();
    let api = Arc::new(FakeSwapApi::new("0.01", 1));
    let rpc = Arc::new(FakeRpc::with_balance(FUNDED));
    let executor = test_executor(api.clone(), rpc.clone(), &config);
    let keypair = Keypair::new();

    let outcome = executor.execute(&keypair).await.unwrap();

    assert!(!outcome.simulated_only);
    assert_eq!(outcome.in_amount, 10_000_000);
    assert_eq!(outcome.out_amount, 1_500_000);
    assert_eq!(outcome.slippage_bps, 50);
    assert_eq!(outcome.priority_fee, PriorityFee::Auto);
    assert_eq!(outcome.units_consumed, Some(120_000));

    let sent = rpc.sent.lock();
    assert_eq!(sent.len(), 1);
    assert_eq!(outcome.signature, sent[0].signatures[0].to_string());
    assert!(sent[0].verify_with_results().iter().all(|ok| *ok));

    assert_eq!(api.quotes.lock().len(), 1);
    let swaps = api.swaps.lock();
    assert_eq!(swaps[0].prioritization_fee_lamports.as_deref(), Some("auto"));
    assert_eq!(swaps[0].fee_account, None);

    assert!(outcome.logs.iter().any(|l| l.starts_with("Confirmed")));
}

#[tokio::test]
async fn test_insufficient_balance_stops_before_quote() {
    let config = AppConfig::default();
    let api = Arc::new(FakeSwapApi::new("0.01", 1));
    let rpc = Arc::new(FakeRpc::with_balance(14_999_999));
    let executor = test_executor(api.clone(), rpc, &config);

    let failure = executor.execute(&Keypair::new()).await.unwrap_err();

    assert!(matches!(
        failure.error,
        AppError::InsufficientBalance {
            required: 15_000_000,
            available: 14_999_999
        }
    ));
    assert!(api.quotes.lock().is_empty());
    assert!(failure.logs.last().unwrap().starts_with("Swap failed"));
}

#[tokio::test]
async fn test_high_impact_requotes_with_adjusted_slippage() {
    let config = AppConfig::default();
    let api = Arc::new(FakeSwapApi::new("0.6", 2));
    let rpc = Arc::new(FakeRpc::with_balance(FUNDED));
    let executor = test_executor(api.clone(), rpc, &config);

    let outcome = executor.execute(&Keypair::new()).await.unwrap();

    // 50 base + 50 impact + 15 extra hop
    assert_eq!(outcome.slippage_bps, 115);
    let quotes = api.quotes.lock();
    assert_eq!(quotes.len(), 2);
    assert_eq!(quotes[0].slippage_bps, 50);
    assert_eq!(quotes[1].slippage_bps, 115);
}

#[tokio::test]
async fn test_transient_quote_error_is_retried() {
    let config = AppConfig::default();
    let api = Arc::new(FakeSwapApi::new("0.01", 1));
    api.fail_next_quote(AppError::Http("503 Service Unavailable".into()));
    let rpc = Arc::new(FakeRpc::with_balance(FUNDED));
    let executor = test_executor(api.clone(), rpc, &config);

    executor.execute(&Keypair::new()).await.unwrap();
    assert_eq!(api.quotes.lock().len(), 2);
}

#[tokio::test]
async fn test_rejected_quote_is_not_retried() {
    let config = AppConfig::default();
    let api = Arc::new(FakeSwapApi::new("0.01", 1));
    api.fail_next_quote(AppError::Validation("Jupiter quote rejected (400)".into()));
    let rpc = Arc::new(FakeRpc::with_balance(FUNDED));
    let executor = test_executor(api.clone(), rpc, &config);

    let failure = executor.execute(&Keypair::new()).await.unwrap_err();
    assert!(matches!(failure.error, AppError::Validation(_)));
    assert_eq!(api.quotes.lock().len(), 1);
}

#[tokio::test]
async fn test_simulation_error_is_fatal_and_keeps_logs() {
    let config = AppConfig::default();
    let api = Arc::new(FakeSwapApi::new("0.01", 1));
    let mut rpc = FakeRpc::with_balance(FUNDED);
    rpc.simulation.err = Some("InstructionError(2, Custom(6001))".to_string());
    rpc.simulation.logs = vec!["Program log: slippage tolerance exceeded".to_string()];
    let rpc = Arc::new(rpc);
    let executor = test_executor(api, rpc.clone(), &config);

    let failure = executor.execute(&Keypair::new()).await.unwrap_err();

    assert!(matches!(failure.error, AppError::Simulation(_)));
    assert!(failure
        .logs
        .iter()
        .any(|l| l.contains("slippage tolerance exceeded")));
    assert!(rpc.sent.lock().is_empty());
}

#[tokio::test]
async fn test_dry_run_never_sends() {
    let config = AppConfig::default();
    let api = Arc::new(FakeSwapApi::new("0.01", 1));
    let rpc = Arc::new(FakeRpc::with_balance(FUNDED));
    let executor = test_executor(api, rpc.clone(), &config).with_dry_run(true);

    let outcome = executor.execute(&Keypair::new()).await.unwrap();

    assert!(outcome.simulated_only);
    assert_eq!(*rpc.simulated.lock(), 1);
    assert!(rpc.sent.lock().is_empty());
}

#[tokio::test]
async fn test_send_is_retried_up_to_attempt_limit() {
    let config = AppConfig::default();
    let api = Arc::new(FakeSwapApi::new("0.01", 1));
    let rpc = Arc::new(FakeRpc::with_balance(FUNDED));
    rpc.send_errors.lock().push_back(AppError::Rpc("blockhash not found".into()));
    rpc.send_errors.lock().push_back(AppError::Rpc("node unhealthy".into()));
    let executor = test_executor(api, rpc.clone(), &config);

    let outcome = executor.execute(&Keypair::new()).await.unwrap();

    let sent = rpc.sent.lock();
    assert_eq!(sent.len(), 3);
    // Every attempt resends the same signed transaction
    assert!(sent.iter().all(|tx| tx.signatures == sent[0].signatures));
    assert_eq!(outcome.signature, sent[0].signatures[0].to_string());
}

#[tokio::test]
async fn test_send_gives_up_after_attempt_limit() {
    let config = AppConfig::default();
    let api = Arc::new(FakeSwapApi::new("0.01", 1));
    let rpc = Arc::new(FakeRpc::with_balance(FUNDED));
    for _ in 0..3 {
        rpc.send_errors.lock().push_back(AppError::Rpc("node unhealthy".into()));
    }
    let executor = test_executor(api, rpc.clone(), &config);

    let failure = executor.execute(&Keypair::new()).await.unwrap_err();
    assert!(matches!(failure.error, AppError::Rpc(_)));
    assert_eq!(rpc.sent.lock().len(), 3);
}

#[tokio::test]
async fn test_confirmation_timeout_is_fatal() {
    let config = AppConfig::default();
    let api = Arc::new(FakeSwapApi::new("0.01", 1));
    let rpc = Arc::new(FakeRpc::with_balance(FUNDED));
    *rpc.confirm_result.lock() = Some(AppError::Timeout("not confirmed within 60s".into()));
    let executor = test_executor(api, rpc, &config);

    let failure = executor.execute(&Keypair::new()).await.unwrap_err();
    assert!(matches!(failure.error, AppError::Timeout(_)));
    assert!(failure.logs.iter().any(|l| l.starts_with("Sent")));
}

#[tokio::test]
async fn test_platform_fee_is_forwarded() {
    let mut config = AppConfig::default();
    let recipient = Pubkey::new_unique();
    config.wallet.fee_basis_points = 25;
    config.wallet.fee_recipient = Some(recipient.to_string());

    let api = Arc::new(FakeSwapApi::new("0.01", 1));
    let rpc = Arc::new(FakeRpc::with_balance(FUNDED));
    let executor = test_executor(api.clone(), rpc, &config);

    executor.execute(&Keypair::new()).await.unwrap();

    let quotes = api.quotes.lock();
    assert_eq!(quotes[0].platform_fee_bps, Some(25));
    assert_eq!(quotes[0].fee_account, Some(recipient.to_string()));
    assert_eq!(api.swaps.lock()[0].fee_account, Some(recipient.to_string()));
}

#[tokio::test]
async fn test_fixed_priority_fee_is_sent_as_compute_unit_price() {
    let config = config_with_mode(PriorityFeeMode::Fixed);
    let api = Arc::new(FakeSwapApi::new("0.01", 1));
    let rpc = Arc::new(FakeRpc::with_balance(FUNDED));
    let executor = test_executor(api.clone(), rpc, &config);

    let outcome = executor.execute(&Keypair::new()).await.unwrap();

    assert_eq!(outcome.priority_fee, PriorityFee::MicroLamports(50_000));
    let swaps = api.swaps.lock();
    assert_eq!(swaps[0].compute_unit_price_micro_lamports, Some(50_000));
    assert_eq!(swaps[0].prioritization_fee_lamports, None);
}

#[tokio::test]
async fn test_dynamic_priority_fee_uses_recent_fees() {
    let config = config_with_mode(PriorityFeeMode::Dynamic);
    let api = Arc::new(FakeSwapApi::new("0.01", 1));
    let rpc = Arc::new(FakeRpc::with_balance(FUNDED));
    let executor = test_executor(api, rpc, &config);

    let outcome = executor.execute(&Keypair::new()).await.unwrap();

    // 75th percentile of the paying samples (4000) times 1.2
    match outcome.priority_fee {
        PriorityFee::MicroLamports(price) => assert!((4_800..=4_801).contains(&price)),
        PriorityFee::Auto => panic!("dynamic mode resolved to auto"),
    }
}
