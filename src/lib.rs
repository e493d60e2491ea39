//! solswap library
//!
//! Jupiter SOL→USDC swap tooling for Solana.
//! This library exposes core modules for the binaries and tests.

pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod report;
pub mod utils;
pub mod wallet;

// Re-export commonly used types for tests
pub use config::{AppConfig, PriorityFeeMode};
pub use engine::{SwapExecutor, SwapFailure, SwapOutcome};
pub use error::{AppError, AppResult};
pub use handlers::{router, LiveSwapService, SwapService, SwapState};
pub use metrics::MetricsState;
