//! Wallet balance check

use serde::Serialize;
use solana_sdk::pubkey::Pubkey;

use crate::engine::rpc::ChainRpc;
use crate::error::AppResult;
use crate::utils::lamports_to_sol;

/// Wallet balance at a given slot
#[derive(Debug, Clone, Serialize)]
pub struct BalanceReport {
    pub owner: String,
    pub lamports: u64,
    pub sol: f64,
    pub slot: u64,
}

impl BalanceReport {
    /// Whether the balance covers `amount` plus `reserve` lamports
    pub fn sufficient_for(&self, amount: u64, reserve: u64) -> bool {
        self.lamports >= amount.saturating_add(reserve)
    }
}

/// Fetch balance and slot for `owner`
pub async fn check_balance(rpc: &dyn ChainRpc, owner: &Pubkey) -> AppResult<BalanceReport> {
    let health = rpc.health(owner).await?;
    let report = BalanceReport {
        owner: owner.to_string(),
        lamports: health.balance_lamports,
        sol: lamports_to_sol(health.balance_lamports),
        slot: health.slot,
    };

    tracing::info!(
        owner = %report.owner,
        lamports = report.lamports,
        slot = report.slot,
        "Balance checked"
    );

    Ok(report)
}
