//! Swap executor
//!
//! Runs the full SOL→USDC flow: health check, quote, adaptive slippage,
//! priority fee, build and sign, simulate, send, confirm. Every step is
//! recorded in a journal that is returned to the caller alongside the result.

use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    transaction::VersionedTransaction,
};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{AppConfig, JupiterConfig, SlippageConfig};
use crate::constants::programs;
use crate::engine::jupiter::{JupiterClient, QuoteRequest, QuoteResponse, SwapApi, SwapRequest};
use crate::engine::priority_fee::{PriorityFee, PriorityFeeEstimator};
use crate::engine::retry::{retry, RetryPolicy};
use crate::engine::rpc::{ChainRpc, HealthSnapshot, SolanaRpc};
use crate::engine::slippage::adjust_slippage;
use crate::engine::transaction_builder::build_signed_transaction;
use crate::error::{AppError, AppResult};
use crate::utils::lamports_to_sol;
use crate::wallet::{parse_pubkey, validate_fee_bps};

/// Everything the executor needs besides its collaborators
#[derive(Debug, Clone)]
pub struct SwapSettings {
    pub input_mint: String,
    pub output_mint: String,
    pub amount_lamports: u64,
    pub balance_reserve_lamports: u64,
    pub fee_bps: u16,
    pub fee_recipient: Option<Pubkey>,
    pub slippage: SlippageConfig,
    pub routing: JupiterConfig,
    pub retry: RetryPolicy,
    pub send_attempts: u32,
    pub dry_run: bool,
}

impl SwapSettings {
    /// Build settings from configuration, validating fee bps and recipient
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let fee_bps = validate_fee_bps(i64::from(config.wallet.fee_basis_points))?;
        let fee_recipient = config
            .wallet
            .fee_recipient
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(parse_pubkey)
            .transpose()?;

        if fee_bps > 0 && fee_recipient.is_none() {
            return Err(AppError::Validation(
                "FEE_RECIPIENT is required when FEE_BASIS_POINTS is above zero".to_string(),
            ));
        }

        Ok(Self {
            input_mint: config.swap.input_mint.clone(),
            output_mint: config.swap.output_mint.clone(),
            amount_lamports: config.swap.amount_lamports,
            balance_reserve_lamports: config.swap.balance_reserve_lamports,
            fee_bps,
            fee_recipient,
            slippage: config.slippage.clone(),
            routing: config.jupiter.clone(),
            retry: RetryPolicy::from(&config.retry),
            send_attempts: config.rpc.send_attempts.max(1),
            dry_run: false,
        })
    }

    /// Lamports the wallet must hold before swapping
    pub fn required_lamports(&self) -> u64 {
        self.amount_lamports
            .saturating_add(self.balance_reserve_lamports)
    }
}

/// Step log for a single swap run
#[derive(Debug, Clone)]
pub struct SwapJournal {
    run_id: String,
    entries: Vec<String>,
}

impl SwapJournal {
    pub fn new() -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            entries: Vec::new(),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Record a step and emit it as a tracing event
    pub fn record(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(run_id = %self.run_id, "{}", message);
        self.entries.push(message);
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<String> {
        self.entries
    }
}

impl Default for SwapJournal {
    fn default() -> Self {
        Self::new()
    }
}

/// Signed swap ready for simulation
#[derive(Debug, Clone)]
pub struct PreparedSwap {
    pub transaction: VersionedTransaction,
    pub quote: QuoteResponse,
    pub slippage_bps: u16,
    pub priority_fee: PriorityFee,
    pub health: HealthSnapshot,
    pub last_valid_block_height: Option<u64>,
}

/// Successful swap run
#[derive(Debug, Clone)]
pub struct SwapOutcome {
    pub signature: String,
    pub logs: Vec<String>,
    pub in_amount: u64,
    pub out_amount: u64,
    pub slippage_bps: u16,
    pub priority_fee: PriorityFee,
    pub units_consumed: Option<u64>,
    /// Dry run: simulated but never sent
    pub simulated_only: bool,
}

/// Failed swap run, with the steps that ran before the failure
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct SwapFailure {
    pub error: AppError,
    pub logs: Vec<String>,
}

/// Swap executor
pub struct SwapExecutor {
    api: Arc<dyn SwapApi>,
    rpc: Arc<dyn ChainRpc>,
    fees: PriorityFeeEstimator,
    settings: SwapSettings,
}

impl SwapExecutor {
    pub fn new(
        api: Arc<dyn SwapApi>,
        rpc: Arc<dyn ChainRpc>,
        fees: PriorityFeeEstimator,
        settings: SwapSettings,
    ) -> Self {
        Self {
            api,
            rpc,
            fees,
            settings,
        }
    }

    /// Executor talking to the configured Jupiter API and RPC endpoint
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        Self::from_config_with_rpc(config, Arc::new(SolanaRpc::new(&config.rpc)))
    }

    /// Executor using the configured Jupiter API and an existing RPC client
    pub fn from_config_with_rpc(config: &AppConfig, rpc: Arc<dyn ChainRpc>) -> AppResult<Self> {
        let settings = SwapSettings::from_config(config)?;
        let api: Arc<dyn SwapApi> = Arc::new(JupiterClient::new(&config.jupiter));
        let fees = PriorityFeeEstimator::new(
            config.priority_fee.clone(),
            rpc.clone(),
            &config.rpc.endpoint,
        );
        Ok(Self::new(api, rpc, fees, settings))
    }

    pub fn settings(&self) -> &SwapSettings {
        &self.settings
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.settings.dry_run = dry_run;
        self
    }

    pub fn with_amount(mut self, amount_lamports: u64) -> Self {
        self.settings.amount_lamports = amount_lamports;
        self
    }

    pub fn rpc(&self) -> Arc<dyn ChainRpc> {
        self.rpc.clone()
    }

    /// Quote `amount` at `slippage_bps`, with retry
    pub async fn quote(&self, amount: u64, slippage_bps: u16) -> AppResult<QuoteResponse> {
        let fee_account = self.settings.fee_recipient.map(|k| k.to_string());
        let request = QuoteRequest::new(
            &self.settings.input_mint,
            &self.settings.output_mint,
            amount,
            slippage_bps,
        )
        .with_routing(&self.settings.routing)
        .with_platform_fee(self.settings.fee_bps, fee_account);

        retry("jupiter_quote", self.settings.retry, || self.api.quote(&request)).await
    }

    /// Health check, quote, slippage, fee, build and sign
    pub async fn prepare(
        &self,
        keypair: &Keypair,
        journal: &mut SwapJournal,
    ) -> AppResult<PreparedSwap> {
        let owner = keypair.pubkey();
        let amount = self.settings.amount_lamports;
        journal.record(format!(
            "Wallet {} swapping {} lamports ({} SOL)",
            owner,
            amount,
            lamports_to_sol(amount)
        ));

        let health = retry("rpc_health", self.settings.retry, || self.rpc.health(&owner)).await?;
        journal.record(format!(
            "Balance {} lamports at slot {}",
            health.balance_lamports, health.slot
        ));

        let required = self.settings.required_lamports();
        if health.balance_lamports < required {
            return Err(AppError::InsufficientBalance {
                required,
                available: health.balance_lamports,
            });
        }

        let base_slippage = self.settings.slippage.base_bps;
        let mut quote = self.quote(amount, base_slippage).await?;
        journal.record(format!(
            "Quote: {} -> {} out, price impact {}%, {} hop(s) via {}",
            quote.in_amount,
            quote.out_amount,
            quote.price_impact_pct(),
            quote.hops(),
            quote.route_labels().join(" > ")
        ));

        let slippage_bps = adjust_slippage(
            &self.settings.slippage,
            quote.price_impact_pct(),
            quote.hops(),
        );
        if slippage_bps != base_slippage {
            journal.record(format!(
                "Slippage adjusted {} -> {} bps, re-quoting",
                base_slippage, slippage_bps
            ));
            quote = self.quote(amount, slippage_bps).await?;
        } else {
            journal.record(format!("Slippage {} bps", slippage_bps));
        }

        let priority_fee = self.fees.resolve(&self.fee_accounts()).await;
        journal.record(format!(
            "Priority fee ({}): {}",
            self.fees.mode(),
            priority_fee
        ));

        let mut request = SwapRequest::new(quote.clone(), owner.to_string())
            .with_priority_fee(priority_fee);
        request.as_legacy_transaction = self.settings.routing.as_legacy_transaction;
        request.fee_account = self.fee_account();

        let swap = retry("jupiter_swap", self.settings.retry, || {
            self.api.swap_transaction(&request)
        })
        .await?;

        let transaction = build_signed_transaction(&swap.swap_transaction, keypair)?;
        journal.record(format!(
            "Swap transaction built and signed ({})",
            transaction
                .signatures
                .first()
                .map(|s| s.to_string())
                .unwrap_or_default()
        ));

        Ok(PreparedSwap {
            transaction,
            quote,
            slippage_bps,
            priority_fee,
            health,
            last_valid_block_height: swap.last_valid_block_height,
        })
    }

    /// Run the whole swap
    pub async fn execute(&self, keypair: &Keypair) -> Result<SwapOutcome, SwapFailure> {
        let mut journal = SwapJournal::new();
        match self.run(keypair, &mut journal).await {
            Ok(mut outcome) => {
                outcome.logs = journal.into_entries();
                Ok(outcome)
            }
            Err(error) => {
                journal.record(format!("Swap failed: {}", error));
                Err(SwapFailure {
                    error,
                    logs: journal.into_entries(),
                })
            }
        }
    }

    async fn run(&self, keypair: &Keypair, journal: &mut SwapJournal) -> AppResult<SwapOutcome> {
        let prepared = self.prepare(keypair, journal).await?;
        let in_amount = prepared.quote.in_amount().unwrap_or(self.settings.amount_lamports);
        let out_amount = prepared.quote.out_amount()?;

        let simulation = self.rpc.simulate(&prepared.transaction).await?;
        if let Some(err) = simulation.err {
            for line in &simulation.logs {
                journal.record(format!("sim: {}", line));
            }
            return Err(AppError::Simulation(err));
        }
        journal.record(format!(
            "Simulation succeeded ({} compute units)",
            simulation
                .units_consumed
                .map(|u| u.to_string())
                .unwrap_or_else(|| "unknown".to_string())
        ));

        let expected_signature = prepared
            .transaction
            .signatures
            .first()
            .map(|s| s.to_string())
            .unwrap_or_default();

        if self.settings.dry_run {
            journal.record("Dry run: transaction not sent");
            return Ok(SwapOutcome {
                signature: expected_signature,
                logs: Vec::new(),
                in_amount,
                out_amount,
                slippage_bps: prepared.slippage_bps,
                priority_fee: prepared.priority_fee,
                units_consumed: simulation.units_consumed,
                simulated_only: true,
            });
        }

        let signature = self.send_with_attempts(&prepared.transaction, journal).await?;
        journal.record(format!("Sent {}, awaiting confirmation", signature));

        self.rpc
            .confirm(&signature)
            .await
            .map_err(|e| match e {
                AppError::Timeout(_) | AppError::Confirmation(_) => e,
                other => AppError::Confirmation(other.to_string()),
            })?;
        journal.record(format!("Confirmed {}", signature));

        Ok(SwapOutcome {
            signature: signature.to_string(),
            logs: Vec::new(),
            in_amount,
            out_amount,
            slippage_bps: prepared.slippage_bps,
            priority_fee: prepared.priority_fee,
            units_consumed: simulation.units_consumed,
            simulated_only: false,
        })
    }

    /// Manual send loop; resending the same signed transaction is idempotent
    async fn send_with_attempts(
        &self,
        transaction: &VersionedTransaction,
        journal: &mut SwapJournal,
    ) -> AppResult<solana_sdk::signature::Signature> {
        let max_attempts = self.settings.send_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.rpc.send(transaction).await {
                Ok(signature) => return Ok(signature),
                Err(e) if attempt < max_attempts => {
                    let delay: Duration = self.settings.retry.delay_after(attempt);
                    journal.record(format!(
                        "Send attempt {}/{} failed: {}; retrying in {}ms",
                        attempt,
                        max_attempts,
                        e,
                        delay.as_millis()
                    ));
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn fee_account(&self) -> Option<String> {
        if self.settings.fee_bps > 0 {
            self.settings.fee_recipient.map(|k| k.to_string())
        } else {
            None
        }
    }

    /// Accounts whose recent fees drive the dynamic estimate
    fn fee_accounts(&self) -> Vec<Pubkey> {
        [
            self.settings.input_mint.as_str(),
            self.settings.output_mint.as_str(),
            programs::JUPITER,
        ]
        .iter()
        .filter_map(|s| Pubkey::from_str(s).ok())
        .collect()
    }
}
