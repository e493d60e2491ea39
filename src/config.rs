//! Configuration management for the swap operator
//!
//! Loads configuration from optional config files and environment variables.
//! The flat variables (`PRIVATE_KEY`, `FEE_RECIPIENT`, `RPC_ENDPOINT`, ...)
//! override everything else.

use config::{Config, ConfigError, Environment, File};
use secrecy::SecretString;
use serde::Deserialize;
use std::path::PathBuf;

use crate::constants::{self, MAX_BASIS_POINTS};

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// RPC endpoint configuration
    #[serde(default)]
    pub rpc: RpcConfig,
    /// Wallet and platform fee settings
    #[serde(default)]
    pub wallet: WalletConfig,
    /// Jupiter API configuration
    #[serde(default)]
    pub jupiter: JupiterConfig,
    /// Swap pair and size
    #[serde(default)]
    pub swap: SwapConfig,
    /// Slippage bounds
    #[serde(default)]
    pub slippage: SlippageConfig,
    /// Priority fee strategy
    #[serde(default)]
    pub priority_fee: PriorityFeeConfig,
    /// Retry policy for Jupiter and RPC calls
    #[serde(default)]
    pub retry: RetryConfig,
    /// Mock performance report settings
    #[serde(default)]
    pub report: ReportConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// RPC endpoint configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RpcConfig {
    /// RPC endpoint URL (`RPC_ENDPOINT`)
    #[serde(default = "default_rpc_endpoint")]
    pub endpoint: String,
    /// Commitment level: processed, confirmed or finalized
    #[serde(default = "default_commitment")]
    pub commitment: String,
    /// Request timeout in milliseconds
    #[serde(default = "default_rpc_timeout")]
    pub timeout_ms: u64,
    /// How long to wait for confirmation before giving up
    #[serde(default = "default_confirm_timeout")]
    pub confirm_timeout_secs: u64,
    /// Manual send attempts
    #[serde(default = "default_send_attempts")]
    pub send_attempts: u32,
    /// Retries the RPC node itself performs per send
    #[serde(default = "default_node_max_retries")]
    pub node_max_retries: usize,
}

fn default_rpc_endpoint() -> String {
    constants::DEFAULT_RPC_ENDPOINT.to_string()
}

fn default_commitment() -> String {
    "confirmed".to_string()
}

fn default_rpc_timeout() -> u64 {
    30_000
}

fn default_confirm_timeout() -> u64 {
    60
}

fn default_send_attempts() -> u32 {
    3
}

fn default_node_max_retries() -> usize {
    3
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            endpoint: default_rpc_endpoint(),
            commitment: default_commitment(),
            timeout_ms: default_rpc_timeout(),
            confirm_timeout_secs: default_confirm_timeout(),
            send_attempts: default_send_attempts(),
            node_max_retries: default_node_max_retries(),
        }
    }
}

/// Wallet configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WalletConfig {
    /// Base58 64-byte secret key (`PRIVATE_KEY`)
    #[serde(default)]
    pub private_key: Option<SecretString>,
    /// Base58 public key receiving the platform fee (`FEE_RECIPIENT`)
    #[serde(default)]
    pub fee_recipient: Option<String>,
    /// Platform fee in basis points (`FEE_BASIS_POINTS`)
    #[serde(default)]
    pub fee_basis_points: u32,
}

/// Jupiter API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct JupiterConfig {
    /// Jupiter API base URL
    #[serde(default = "default_jupiter_api_url")]
    pub api_url: String,
    /// Restrict routing to single-hop routes
    #[serde(default)]
    pub only_direct_routes: bool,
    /// DEX labels Jupiter should not route through
    #[serde(default)]
    pub exclude_dexes: Vec<String>,
    /// Cap on accounts used by the route
    #[serde(default)]
    pub max_accounts: Option<u32>,
    /// Ask for a legacy transaction instead of v0
    #[serde(default)]
    pub as_legacy_transaction: bool,
    /// HTTP timeout in milliseconds
    #[serde(default = "default_jupiter_timeout")]
    pub timeout_ms: u64,
}

fn default_jupiter_api_url() -> String {
    constants::JUPITER_API_URL.to_string()
}

fn default_jupiter_timeout() -> u64 {
    10_000
}

impl Default for JupiterConfig {
    fn default() -> Self {
        Self {
            api_url: default_jupiter_api_url(),
            only_direct_routes: false,
            exclude_dexes: Vec::new(),
            max_accounts: None,
            as_legacy_transaction: false,
            timeout_ms: default_jupiter_timeout(),
        }
    }
}

/// Swap pair and fixed size
#[derive(Debug, Clone, Deserialize)]
pub struct SwapConfig {
    /// Input mint (SOL)
    #[serde(default = "default_input_mint")]
    pub input_mint: String,
    /// Output mint (USDC)
    #[serde(default = "default_output_mint")]
    pub output_mint: String,
    /// Fixed swap size in lamports
    #[serde(default = "default_amount_lamports")]
    pub amount_lamports: u64,
    /// Lamports kept aside for fees and rent on top of the swap amount
    #[serde(default = "default_balance_reserve")]
    pub balance_reserve_lamports: u64,
}

fn default_input_mint() -> String {
    constants::mints::SOL.to_string()
}

fn default_output_mint() -> String {
    constants::mints::USDC.to_string()
}

fn default_amount_lamports() -> u64 {
    10_000_000 // 0.01 SOL
}

fn default_balance_reserve() -> u64 {
    5_000_000 // 0.005 SOL
}

impl Default for SwapConfig {
    fn default() -> Self {
        Self {
            input_mint: default_input_mint(),
            output_mint: default_output_mint(),
            amount_lamports: default_amount_lamports(),
            balance_reserve_lamports: default_balance_reserve(),
        }
    }
}

/// Slippage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SlippageConfig {
    /// Slippage used for the first quote
    #[serde(default = "default_base_slippage")]
    pub base_bps: u16,
    /// Lower clamp for adaptive slippage
    #[serde(default = "default_min_slippage")]
    pub min_bps: u16,
    /// Upper clamp for adaptive slippage
    #[serde(default = "default_max_slippage")]
    pub max_bps: u16,
    /// Adjust slippage from price impact and hop count
    #[serde(default = "default_true")]
    pub adaptive: bool,
}

fn default_base_slippage() -> u16 {
    50
}

fn default_min_slippage() -> u16 {
    10
}

fn default_max_slippage() -> u16 {
    300
}

fn default_true() -> bool {
    true
}

impl Default for SlippageConfig {
    fn default() -> Self {
        Self {
            base_bps: default_base_slippage(),
            min_bps: default_min_slippage(),
            max_bps: default_max_slippage(),
            adaptive: true,
        }
    }
}

/// Priority fee mode (`PRIORITY_FEE_MODE`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityFeeMode {
    /// Let Jupiter pick the fee
    #[default]
    Auto,
    /// Fixed compute-unit price
    Fixed,
    /// Percentile of recent prioritization fees times a multiplier
    Dynamic,
    /// Helius priority fee estimate
    Helius,
}

impl std::fmt::Display for PriorityFeeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Fixed => write!(f, "fixed"),
            Self::Dynamic => write!(f, "dynamic"),
            Self::Helius => write!(f, "helius"),
        }
    }
}

impl std::str::FromStr for PriorityFeeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "fixed" => Ok(Self::Fixed),
            "dynamic" => Ok(Self::Dynamic),
            "helius" => Ok(Self::Helius),
            other => Err(format!(
                "unknown priority fee mode '{}' (expected auto|fixed|dynamic|helius)",
                other
            )),
        }
    }
}

/// Priority fee configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PriorityFeeConfig {
    /// Fee strategy
    #[serde(default)]
    pub mode: PriorityFeeMode,
    /// Compute-unit price for fixed mode (micro-lamports)
    #[serde(default = "default_fixed_priority_fee")]
    pub fixed_micro_lamports: u64,
    /// Multiplier applied to the dynamic percentile
    #[serde(default = "default_dynamic_multiplier")]
    pub dynamic_multiplier: f64,
    /// Hard cap for any computed fee (micro-lamports)
    #[serde(default = "default_max_priority_fee")]
    pub max_micro_lamports: u64,
    /// Percentile of recent fees used by dynamic mode
    #[serde(default = "default_fee_percentile")]
    pub percentile: u8,
    /// Helius priority level
    #[serde(default = "default_helius_level")]
    pub helius_priority_level: String,
}

fn default_fixed_priority_fee() -> u64 {
    50_000
}

fn default_dynamic_multiplier() -> f64 {
    1.2
}

fn default_max_priority_fee() -> u64 {
    2_000_000
}

fn default_fee_percentile() -> u8 {
    75
}

fn default_helius_level() -> String {
    "High".to_string()
}

impl Default for PriorityFeeConfig {
    fn default() -> Self {
        Self {
            mode: PriorityFeeMode::default(),
            fixed_micro_lamports: default_fixed_priority_fee(),
            dynamic_multiplier: default_dynamic_multiplier(),
            max_micro_lamports: default_max_priority_fee(),
            percentile: default_fee_percentile(),
            helius_priority_level: default_helius_level(),
        }
    }
}

/// Retry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Total attempts including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles afterwards
    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay() -> u64 {
    1_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay(),
        }
    }
}

/// Mock performance report configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// Directory the JSON report is written to
    #[serde(default = "default_report_dir")]
    pub output_dir: PathBuf,
    /// Number of mock swap runs
    #[serde(default = "default_report_samples")]
    pub samples: usize,
}

fn default_report_dir() -> PathBuf {
    PathBuf::from("reports")
}

fn default_report_samples() -> usize {
    100
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_report_dir(),
            samples: default_report_samples(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            rpc: RpcConfig::default(),
            wallet: WalletConfig::default(),
            jupiter: JupiterConfig::default(),
            swap: SwapConfig::default(),
            slippage: SlippageConfig::default(),
            priority_fee: PriorityFeeConfig::default(),
            retry: RetryConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

/// Flat environment variables mapped onto config keys
const FLAT_ENV_OVERRIDES: &[(&str, &str)] = &[
    ("PRIVATE_KEY", "wallet.private_key"),
    ("FEE_RECIPIENT", "wallet.fee_recipient"),
    ("FEE_BASIS_POINTS", "wallet.fee_basis_points"),
    ("RPC_ENDPOINT", "rpc.endpoint"),
    ("PRIORITY_FEE_MODE", "priority_fee.mode"),
    ("FIXED_PRIORITY_FEE_MICRO_LAMPORTS", "priority_fee.fixed_micro_lamports"),
    ("DYNAMIC_PRIORITY_FEE_MULTIPLIER", "priority_fee.dynamic_multiplier"),
    ("MAX_PRIORITY_FEE_MICRO_LAMPORTS", "priority_fee.max_micro_lamports"),
];

impl AppConfig {
    /// Load configuration from files and environment
    ///
    /// Priority (highest to lowest):
    /// 1. Flat variables (PRIVATE_KEY, RPC_ENDPOINT, ...)
    /// 2. Environment variables (SOLSWAP_*)
    /// 3. config/config.{toml,yaml,json} (if exists)
    /// 4. config.{toml,yaml,json} (if exists)
    /// 5. Default values
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(File::with_name("config/config").required(false))
            // SOLSWAP_SERVER__PORT=8081 -> server.port = 8081
            .add_source(
                Environment::with_prefix("SOLSWAP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("jupiter.exclude_dexes"),
            );

        for (var, key) in FLAT_ENV_OVERRIDES {
            let value = std::env::var(var)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(|v| match *var {
                    "PRIORITY_FEE_MODE" => v.to_ascii_lowercase(),
                    _ => v,
                });
            builder = builder.set_override_option(*key, value)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.wallet.fee_basis_points > u32::from(MAX_BASIS_POINTS) {
            return Err(ConfigError::Message(format!(
                "FEE_BASIS_POINTS must be within 0..={}, got {}",
                MAX_BASIS_POINTS, self.wallet.fee_basis_points
            )));
        }

        if self.rpc.endpoint.trim().is_empty() {
            return Err(ConfigError::Message("RPC endpoint must be set".to_string()));
        }

        if self.jupiter.api_url.trim().is_empty() {
            return Err(ConfigError::Message("Jupiter API URL must be set".to_string()));
        }

        let s = &self.slippage;
        if s.min_bps > s.max_bps || s.max_bps > MAX_BASIS_POINTS {
            return Err(ConfigError::Message(format!(
                "Slippage bounds invalid: min {} max {} (max may not exceed {})",
                s.min_bps, s.max_bps, MAX_BASIS_POINTS
            )));
        }
        if s.base_bps < s.min_bps || s.base_bps > s.max_bps {
            return Err(ConfigError::Message(format!(
                "Base slippage {} must lie within [{}, {}]",
                s.base_bps, s.min_bps, s.max_bps
            )));
        }

        let p = &self.priority_fee;
        if p.max_micro_lamports == 0 {
            return Err(ConfigError::Message(
                "MAX_PRIORITY_FEE_MICRO_LAMPORTS must be positive".to_string(),
            ));
        }
        if p.fixed_micro_lamports > p.max_micro_lamports {
            return Err(ConfigError::Message(
                "Fixed priority fee must not exceed the maximum".to_string(),
            ));
        }
        if !p.dynamic_multiplier.is_finite() || p.dynamic_multiplier <= 0.0 {
            return Err(ConfigError::Message(
                "DYNAMIC_PRIORITY_FEE_MULTIPLIER must be a positive number".to_string(),
            ));
        }
        if p.percentile > 100 {
            return Err(ConfigError::Message(
                "Priority fee percentile must be within 0..=100".to_string(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Message(
                "Retry max_attempts must be at least 1".to_string(),
            ));
        }

        if self.swap.amount_lamports == 0 {
            return Err(ConfigError::Message("Swap amount must be positive".to_string()));
        }

        Ok(())
    }
}
