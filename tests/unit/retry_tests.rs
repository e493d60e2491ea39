//! Retry and in-flight deduplication unit tests

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use solswap::config::RetryConfig;
use solswap::engine::inflight::InFlight;
use solswap::engine::retry::{retry, RetryPolicy};
use solswap::error::AppError;

fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::new(max_attempts, Duration::from_millis(1))
}

#[test]
fn test_delay_doubles() {
    let policy = RetryPolicy::new(5, Duration::from_millis(1_000));
    assert_eq!(policy.delay_after(1), Duration::from_millis(1_000));
    assert_eq!(policy.delay_after(2), Duration::from_millis(2_000));
    assert_eq!(policy.delay_after(3), Duration::from_millis(4_000));
}

#[test]
fn test_policy_from_config() {
    let policy = RetryPolicy::from(&RetryConfig {
        max_attempts: 0,
        base_delay_ms: 250,
    });
    assert_eq!(policy.max_attempts, 1);
    assert_eq!(policy.base_delay, Duration::from_millis(250));
}

#[tokio::test]
async fn test_retryable_error_uses_all_attempts() {
    let calls = AtomicU32::new(0);
    let result: Result<(), _> = retry("test", fast_policy(3), || {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Err(AppError::Http("503".into())) }
    })
    .await;

    assert!(matches!(result, Err(AppError::Http(_))));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_fatal_error_not_retried() {
    let calls = AtomicU32::new(0);
    let result: Result<(), _> = retry("test", fast_policy(5), || {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Err(AppError::Simulation("custom program error".into())) }
    })
    .await;

    assert!(matches!(result, Err(AppError::Simulation(_))));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_recovers_after_transient_failure() {
    let calls = AtomicU32::new(0);
    let result = retry("test", fast_policy(3), || {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        async move {
            if n == 0 {
                Err(AppError::Timeout("slow".into()))
            } else {
                Ok(n)
            }
        }
    })
    .await;

    assert_eq!(result.unwrap(), 1);
}

#[tokio::test]
async fn test_inflight_shares_concurrent_calls() {
    let inflight = Arc::new(InFlight::<u64>::new());
    let calls = Arc::new(AtomicU32::new(0));
    let key = InFlight::<u64>::key("getBalance", "wallet");

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let inflight = inflight.clone();
            let calls = calls.clone();
            let key = key.clone();
            tokio::spawn(async move {
                inflight
                    .run(key, async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok(7)
                    })
                    .await
            })
        })
        .collect();

    for task in tasks {
        assert_eq!(task.await.unwrap().unwrap(), 7);
    }
    assert!(calls.load(Ordering::SeqCst) < 8);
    assert_eq!(inflight.pending(), 0);
}
