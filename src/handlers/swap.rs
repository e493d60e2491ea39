//! Swap endpoint
//!
//! POST /swap runs one SOL→USDC swap with the caller's keypair and returns
//! the signature together with the step log.

use async_trait::async_trait;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use parking_lot::Mutex;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use solana_sdk::signature::{Keypair, Signer};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::config::{AppConfig, RpcConfig};
use crate::engine::executor::{SwapExecutor, SwapFailure, SwapOutcome};
use crate::engine::priority_fee::PriorityFee;
use crate::engine::rpc::SolanaRpc;
use crate::error::{AppError, AppResult, ErrorResponse};
use crate::metrics::MetricsState;
use crate::wallet::{parse_private_key, parse_pubkey, validate_fee_bps};

/// Request body for POST /swap
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequestBody {
    pub private_key: SecretString,
    #[serde(default)]
    pub fee_recipient: Option<String>,
    #[serde(default)]
    pub fee_bps: Option<i64>,
    #[serde(default)]
    pub rpc_endpoint: Option<String>,
}

/// Successful swap response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapResponseBody {
    pub success: bool,
    pub signature: String,
    pub logs: Vec<String>,
}

/// Validated swap parameters
pub struct SwapParams {
    pub keypair: Keypair,
    pub fee_recipient: Option<String>,
    pub fee_bps: Option<u16>,
    pub rpc_endpoint: Option<String>,
}

impl SwapParams {
    /// Validate a request body; every failure is a validation error
    pub fn from_body(body: SwapRequestBody) -> AppResult<Self> {
        let keypair = parse_private_key(body.private_key.expose_secret())?;

        let fee_recipient = body
            .fee_recipient
            .filter(|s| !s.trim().is_empty())
            .map(|s| parse_pubkey(&s).map(|key| key.to_string()))
            .transpose()?;

        let fee_bps = body.fee_bps.map(validate_fee_bps).transpose()?;

        let rpc_endpoint = body
            .rpc_endpoint
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        if let Some(endpoint) = &rpc_endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(AppError::Validation(format!(
                    "RPC endpoint must be an http(s) URL, got '{}'",
                    endpoint
                )));
            }
        }

        Ok(Self {
            keypair,
            fee_recipient,
            fee_bps,
            rpc_endpoint,
        })
    }
}

/// Runs a swap for validated parameters
#[async_trait]
pub trait SwapService: Send + Sync {
    async fn swap(&self, params: SwapParams) -> Result<SwapOutcome, SwapFailure>;
}

/// Swap service backed by Jupiter and the configured RPC
///
/// RPC clients are kept per endpoint so concurrent requests share their
/// in-flight balance and slot reads.
pub struct LiveSwapService {
    config: Arc<AppConfig>,
    rpcs: Mutex<HashMap<String, Arc<SolanaRpc>>>,
}

impl LiveSwapService {
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self {
            config,
            rpcs: Mutex::new(HashMap::new()),
        }
    }

    /// RPC client for `config.endpoint`, created on first use
    pub fn rpc_for(&self, config: &RpcConfig) -> Arc<SolanaRpc> {
        self.rpcs
            .lock()
            .entry(config.endpoint.clone())
            .or_insert_with(|| Arc::new(SolanaRpc::new(config)))
            .clone()
    }

    /// Service configuration with the request's overrides applied
    pub fn effective_config(&self, params: &SwapParams) -> AppConfig {
        let mut config = (*self.config).clone();
        if let Some(recipient) = &params.fee_recipient {
            config.wallet.fee_recipient = Some(recipient.clone());
        }
        if let Some(bps) = params.fee_bps {
            config.wallet.fee_basis_points = u32::from(bps);
        }
        if let Some(endpoint) = &params.rpc_endpoint {
            config.rpc.endpoint = endpoint.clone();
        }
        config
    }
}

#[async_trait]
impl SwapService for LiveSwapService {
    async fn swap(&self, params: SwapParams) -> Result<SwapOutcome, SwapFailure> {
        let config = self.effective_config(&params);
        let rpc = self.rpc_for(&config.rpc);
        let executor =
            SwapExecutor::from_config_with_rpc(&config, rpc).map_err(|error| SwapFailure {
                error,
                logs: Vec::new(),
            })?;
        executor.execute(&params.keypair).await
    }
}

/// Shared state for the swap endpoint
pub struct SwapState {
    pub service: Arc<dyn SwapService>,
    pub metrics: Arc<MetricsState>,
}

/// Swap handler
///
/// POST /swap
pub async fn swap_handler(
    State(state): State<Arc<SwapState>>,
    body: Result<Json<SwapRequestBody>, JsonRejection>,
) -> Response {
    let started = Instant::now();

    let params = match body
        .map_err(|e| AppError::Validation(e.body_text()))
        .and_then(|Json(body)| SwapParams::from_body(body))
    {
        Ok(params) => params,
        Err(error) => {
            state.metrics.observe_swap(error.reason(), 0.0);
            return error.into_response();
        }
    };

    let wallet = params.keypair.pubkey();
    tracing::info!(wallet = %wallet, "Swap requested");

    let result = state.service.swap(params).await;
    let latency_ms = started.elapsed().as_millis() as f64;

    match result {
        Ok(outcome) => {
            let label = if outcome.simulated_only {
                "simulated"
            } else {
                "success"
            };
            state.metrics.observe_swap(label, latency_ms);
            state.metrics.priority_fee.set(match outcome.priority_fee {
                PriorityFee::Auto => 0,
                PriorityFee::MicroLamports(price) => i64::try_from(price).unwrap_or(i64::MAX),
            });

            tracing::info!(
                wallet = %wallet,
                signature = %outcome.signature,
                latency_ms,
                "Swap completed"
            );

            (
                StatusCode::OK,
                Json(SwapResponseBody {
                    success: true,
                    signature: outcome.signature,
                    logs: outcome.logs,
                }),
            )
                .into_response()
        }
        Err(SwapFailure { error, logs }) => {
            state.metrics.observe_swap(error.reason(), latency_ms);
            let status_code = error.status_code();

            tracing::error!(
                wallet = %wallet,
                error = %error,
                status_code = %status_code,
                "Swap failed"
            );

            (status_code, Json(ErrorResponse::new(&error, logs))).into_response()
        }
    }
}
