//! Swap engine
//!
//! Jupiter and Solana RPC clients plus the pieces the swap flow is built
//! from: slippage, priority fees, retries, signing and orchestration.

pub mod balance;
pub mod executor;
pub mod inflight;
pub mod jupiter;
pub mod priority_fee;
pub mod retry;
pub mod rpc;
pub mod slippage;
pub mod transaction_builder;

pub use balance::{check_balance, BalanceReport};
pub use executor::{SwapExecutor, SwapFailure, SwapJournal, SwapOutcome, SwapSettings};
pub use jupiter::{JupiterClient, QuoteRequest, QuoteResponse, SwapApi, SwapRequest, SwapResponse};
pub use priority_fee::{PriorityFee, PriorityFeeEstimator};
pub use retry::{retry, RetryPolicy};
pub use rpc::{ChainRpc, HealthSnapshot, SimulationReport, SolanaRpc};
