//! Priority fee resolution
//!
//! Modes:
//! - auto: Jupiter picks the fee (`prioritizationFeeLamports: "auto"`)
//! - fixed: configured compute-unit price
//! - dynamic: percentile of recent prioritization fees times a multiplier
//! - helius: Helius `getPriorityFeeEstimate`
//!
//! Every computed price is capped at `max_micro_lamports`. Dynamic falls back
//! to the fixed price when no paying samples exist; helius falls back to
//! dynamic when the estimate cannot be fetched.

use serde_json::{json, Value};
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{PriorityFeeConfig, PriorityFeeMode};
use crate::engine::rpc::ChainRpc;
use crate::error::{AppError, AppResult};

/// Fee attached to the swap request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityFee {
    /// Jupiter decides
    Auto,
    /// Compute-unit price in micro-lamports
    MicroLamports(u64),
}

impl std::fmt::Display for PriorityFee {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::MicroLamports(price) => write!(f, "{} micro-lamports/CU", price),
        }
    }
}

/// Value at percentile `p` of `samples`
///
/// Sorted ascending, index = len * p / 100 clamped to the last element.
pub fn percentile(samples: &[u64], p: u8) -> Option<u64> {
    if samples.is_empty() {
        return None;
    }

    let mut sorted = samples.to_vec();
    sorted.sort_unstable();

    let index = (sorted.len() * usize::from(p.min(100)) / 100).min(sorted.len() - 1);
    Some(sorted[index])
}

/// Dynamic compute-unit price from recent fee samples
///
/// Zero samples (blocks where nobody paid) are ignored. Returns `None` when
/// there is nothing to base the estimate on.
pub fn dynamic_fee(samples: &[u64], p: u8, multiplier: f64, max: u64) -> Option<u64> {
    let paying: Vec<u64> = samples.iter().copied().filter(|fee| *fee > 0).collect();
    let base = percentile(&paying, p)?;

    let scaled = (base as f64 * multiplier).ceil();
    let price = if scaled.is_finite() && scaled > 0.0 {
        scaled.min(max as f64) as u64
    } else {
        0
    };

    Some(price.min(max))
}

/// Resolves the priority fee for a swap
pub struct PriorityFeeEstimator {
    config: PriorityFeeConfig,
    rpc: Arc<dyn ChainRpc>,
    rpc_endpoint: String,
    http_client: reqwest::Client,
}

impl PriorityFeeEstimator {
    pub fn new(config: PriorityFeeConfig, rpc: Arc<dyn ChainRpc>, rpc_endpoint: &str) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            config,
            rpc,
            rpc_endpoint: rpc_endpoint.to_string(),
            http_client,
        }
    }

    pub fn mode(&self) -> PriorityFeeMode {
        self.config.mode
    }

    /// Resolve the fee for a transaction touching `accounts`
    pub async fn resolve(&self, accounts: &[Pubkey]) -> PriorityFee {
        let fee = match self.config.mode {
            PriorityFeeMode::Auto => PriorityFee::Auto,
            PriorityFeeMode::Fixed => PriorityFee::MicroLamports(self.fixed()),
            PriorityFeeMode::Dynamic => PriorityFee::MicroLamports(self.dynamic(accounts).await),
            PriorityFeeMode::Helius => match self.helius(accounts).await {
                Ok(price) => PriorityFee::MicroLamports(price),
                Err(e) => {
                    tracing::warn!(error = %e, "Helius fee estimate failed, using dynamic fee");
                    PriorityFee::MicroLamports(self.dynamic(accounts).await)
                }
            },
        };

        tracing::info!(mode = %self.config.mode, fee = %fee, "Priority fee resolved");
        fee
    }

    fn fixed(&self) -> u64 {
        self.config.fixed_micro_lamports.min(self.config.max_micro_lamports)
    }

    async fn dynamic(&self, accounts: &[Pubkey]) -> u64 {
        let samples = match self.rpc.get_recent_prioritization_fees(accounts).await {
            Ok(samples) => samples,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch recent prioritization fees");
                return self.fixed();
            }
        };

        match dynamic_fee(
            &samples,
            self.config.percentile,
            self.config.dynamic_multiplier,
            self.config.max_micro_lamports,
        ) {
            Some(price) => {
                tracing::debug!(
                    samples = samples.len(),
                    percentile = self.config.percentile,
                    price,
                    "Dynamic priority fee"
                );
                price
            }
            None => {
                tracing::debug!("No paying fee samples, using fixed priority fee");
                self.fixed()
            }
        }
    }

    async fn helius(&self, accounts: &[Pubkey]) -> AppResult<u64> {
        let keys: Vec<String> = accounts.iter().map(|k| k.to_string()).collect();
        let estimate = fetch_helius_estimate(
            &self.http_client,
            &self.rpc_endpoint,
            &keys,
            &self.config.helius_priority_level,
        )
        .await?;

        Ok((estimate.ceil() as u64).min(self.config.max_micro_lamports))
    }
}

/// Call Helius `getPriorityFeeEstimate` on `endpoint`
pub async fn fetch_helius_estimate(
    http_client: &reqwest::Client,
    endpoint: &str,
    account_keys: &[String],
    priority_level: &str,
) -> AppResult<f64> {
    let body = json!({
        "jsonrpc": "2.0",
        "id": "solswap",
        "method": "getPriorityFeeEstimate",
        "params": [{
            "accountKeys": account_keys,
            "options": { "priorityLevel": priority_level }
        }]
    });

    let response = http_client
        .post(endpoint)
        .json(&body)
        .send()
        .await
        .map_err(|e| AppError::Http(format!("Helius fee estimate request failed: {}", e)))?;

    if !response.status().is_success() {
        return Err(AppError::Http(format!(
            "Helius fee estimate returned {}",
            response.status()
        )));
    }

    let payload: Value = response
        .json()
        .await
        .map_err(|e| AppError::Parse(format!("Failed to parse Helius response: {}", e)))?;

    if let Some(error) = payload.get("error") {
        return Err(AppError::Rpc(format!("Helius fee estimate error: {}", error)));
    }

    payload
        .pointer("/result/priorityFeeEstimate")
        .and_then(Value::as_f64)
        .filter(|v| v.is_finite() && *v >= 0.0)
        .ok_or_else(|| AppError::Parse("Helius response has no priorityFeeEstimate".to_string()))
}
