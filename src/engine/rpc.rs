//! Solana JSON-RPC access
//!
//! Thin wrapper around the nonblocking `RpcClient`. Balance and slot reads go
//! through one in-flight map so concurrent identical reads share one request.
//! Confirmation polls the signature status until the commitment is reached or
//! the transaction fails, bounded by the confirm timeout.

use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::{RpcSendTransactionConfig, RpcSimulateTransactionConfig};
use solana_sdk::{
    commitment_config::CommitmentConfig, pubkey::Pubkey, signature::Signature,
    transaction::VersionedTransaction,
};
use solana_transaction_status::UiTransactionEncoding;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::config::RpcConfig;
use crate::engine::inflight::InFlight;
use crate::error::{AppError, AppResult};

/// Interval between signature status polls
const CONFIRM_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Result of `simulateTransaction`
#[derive(Debug, Clone, Default)]
pub struct SimulationReport {
    /// Transaction error, if the simulation failed
    pub err: Option<String>,
    /// Program logs
    pub logs: Vec<String>,
    /// Compute units consumed
    pub units_consumed: Option<u64>,
}

/// Wallet balance and node liveness, fetched together
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthSnapshot {
    pub balance_lamports: u64,
    pub slot: u64,
}

/// RPC operations used by the swap flow
#[async_trait]
pub trait ChainRpc: Send + Sync {
    async fn get_balance(&self, owner: &Pubkey) -> AppResult<u64>;

    async fn get_slot(&self) -> AppResult<u64>;

    /// Recent prioritization fees (micro-lamports) for `accounts`
    async fn get_recent_prioritization_fees(&self, accounts: &[Pubkey]) -> AppResult<Vec<u64>>;

    async fn simulate(&self, transaction: &VersionedTransaction) -> AppResult<SimulationReport>;

    async fn send(&self, transaction: &VersionedTransaction) -> AppResult<Signature>;

    /// Wait until `signature` reaches the configured commitment
    async fn confirm(&self, signature: &Signature) -> AppResult<()>;

    /// Balance and slot in parallel
    async fn health(&self, owner: &Pubkey) -> AppResult<HealthSnapshot> {
        let (balance, slot) = tokio::join!(self.get_balance(owner), self.get_slot());
        Ok(HealthSnapshot {
            balance_lamports: balance?,
            slot: slot?,
        })
    }
}

/// Parse a commitment level name; unknown names mean `confirmed`
pub fn parse_commitment(level: &str) -> CommitmentConfig {
    match level.trim().to_ascii_lowercase().as_str() {
        "processed" => CommitmentConfig::processed(),
        "finalized" => CommitmentConfig::finalized(),
        _ => CommitmentConfig::confirmed(),
    }
}

/// Solana RPC client
pub struct SolanaRpc {
    client: Arc<RpcClient>,
    endpoint: String,
    commitment: CommitmentConfig,
    confirm_timeout: Duration,
    node_max_retries: usize,
    reads: InFlight<u64>,
}

impl SolanaRpc {
    pub fn new(config: &RpcConfig) -> Self {
        let commitment = parse_commitment(&config.commitment);
        let client = RpcClient::new_with_timeout_and_commitment(
            config.endpoint.clone(),
            Duration::from_millis(config.timeout_ms),
            commitment,
        );

        Self {
            client: Arc::new(client),
            endpoint: config.endpoint.clone(),
            commitment,
            confirm_timeout: Duration::from_secs(config.confirm_timeout_secs),
            node_max_retries: config.node_max_retries,
            reads: InFlight::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ChainRpc for SolanaRpc {
    async fn get_balance(&self, owner: &Pubkey) -> AppResult<u64> {
        let client = self.client.clone();
        let owner = *owner;
        let key = InFlight::<u64>::key("getBalance", &owner.to_string());

        self.reads
            .run(key, async move {
                client
                    .get_balance(&owner)
                    .await
                    .map_err(|e| AppError::Rpc(format!("getBalance failed: {}", e)))
            })
            .await
    }

    async fn get_slot(&self) -> AppResult<u64> {
        let client = self.client.clone();
        let key = InFlight::<u64>::key("getSlot", "");

        self.reads
            .run(key, async move {
                client
                    .get_slot()
                    .await
                    .map_err(|e| AppError::Rpc(format!("getSlot failed: {}", e)))
            })
            .await
    }

    async fn get_recent_prioritization_fees(&self, accounts: &[Pubkey]) -> AppResult<Vec<u64>> {
        let fees = self
            .client
            .get_recent_prioritization_fees(accounts)
            .await
            .map_err(|e| AppError::Rpc(format!("getRecentPrioritizationFees failed: {}", e)))?;

        Ok(fees.into_iter().map(|f| f.prioritization_fee).collect())
    }

    async fn simulate(&self, transaction: &VersionedTransaction) -> AppResult<SimulationReport> {
        let config = RpcSimulateTransactionConfig {
            sig_verify: true,
            replace_recent_blockhash: false,
            commitment: Some(self.commitment),
            encoding: Some(UiTransactionEncoding::Base64),
            ..RpcSimulateTransactionConfig::default()
        };

        let response = self
            .client
            .simulate_transaction_with_config(transaction, config)
            .await
            .map_err(|e| AppError::Rpc(format!("simulateTransaction failed: {}", e)))?;

        let value = response.value;
        Ok(SimulationReport {
            err: value.err.map(|e| format!("{:?}", e)),
            logs: value.logs.unwrap_or_default(),
            units_consumed: value.units_consumed,
        })
    }

    async fn send(&self, transaction: &VersionedTransaction) -> AppResult<Signature> {
        let config = RpcSendTransactionConfig {
            skip_preflight: true,
            preflight_commitment: Some(self.commitment.commitment),
            encoding: Some(UiTransactionEncoding::Base64),
            max_retries: Some(self.node_max_retries),
            ..RpcSendTransactionConfig::default()
        };

        self.client
            .send_transaction_with_config(transaction, config)
            .await
            .map_err(|e| AppError::Rpc(format!("sendTransaction failed: {}", e)))
    }

    async fn confirm(&self, signature: &Signature) -> AppResult<()> {
        let poll = async {
            loop {
                match self
                    .client
                    .get_signature_status_with_commitment(signature, self.commitment)
                    .await
                {
                    Ok(Some(Ok(()))) => return Ok(()),
                    Ok(Some(Err(e))) => {
                        return Err(AppError::Confirmation(format!(
                            "Transaction {} failed on-chain: {}",
                            signature, e
                        )))
                    }
                    Ok(None) => {}
                    Err(e) => {
                        tracing::debug!(error = %e, "Signature status poll failed");
                    }
                }
                tokio::time::sleep(CONFIRM_POLL_INTERVAL).await;
            }
        };

        match timeout(self.confirm_timeout, poll).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Timeout(format!(
                "Transaction {} not confirmed within {}s",
                signature,
                self.confirm_timeout.as_secs()
            ))),
        }
    }
}
