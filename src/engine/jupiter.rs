//! Jupiter v6 Quote and Swap API client
//!
//! `GET /quote` returns a route for a fixed input amount; `POST /swap` turns
//! that quote into a serialized, unsigned transaction (base64). The quote is
//! kept verbatim (unknown fields included) so it can be posted back unchanged.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

use crate::config::JupiterConfig;
use crate::engine::priority_fee::PriorityFee;
use crate::error::{AppError, AppResult};

/// Quote and swap endpoints
#[async_trait]
pub trait SwapApi: Send + Sync {
    /// Fetch a quote
    async fn quote(&self, request: &QuoteRequest) -> AppResult<QuoteResponse>;

    /// Build the swap transaction for a quote
    async fn swap_transaction(&self, request: &SwapRequest) -> AppResult<SwapResponse>;
}

/// Quote request parameters
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteRequest {
    pub input_mint: String,
    pub output_mint: String,
    pub amount: u64,
    pub slippage_bps: u16,
    pub only_direct_routes: bool,
    pub platform_fee_bps: Option<u16>,
    pub fee_account: Option<String>,
    pub exclude_dexes: Vec<String>,
    pub max_accounts: Option<u32>,
    pub as_legacy_transaction: bool,
}

impl QuoteRequest {
    pub fn new(input_mint: &str, output_mint: &str, amount: u64, slippage_bps: u16) -> Self {
        Self {
            input_mint: input_mint.to_string(),
            output_mint: output_mint.to_string(),
            amount,
            slippage_bps,
            only_direct_routes: false,
            platform_fee_bps: None,
            fee_account: None,
            exclude_dexes: Vec::new(),
            max_accounts: None,
            as_legacy_transaction: false,
        }
    }

    /// Apply routing options from configuration
    pub fn with_routing(mut self, config: &JupiterConfig) -> Self {
        self.only_direct_routes = config.only_direct_routes;
        self.exclude_dexes = config.exclude_dexes.clone();
        self.max_accounts = config.max_accounts;
        self.as_legacy_transaction = config.as_legacy_transaction;
        self
    }

    /// Charge a platform fee; ignored when bps is zero
    pub fn with_platform_fee(mut self, fee_bps: u16, fee_account: Option<String>) -> Self {
        if fee_bps > 0 {
            self.platform_fee_bps = Some(fee_bps);
            self.fee_account = fee_account;
        } else {
            self.platform_fee_bps = None;
            self.fee_account = None;
        }
        self
    }

    /// Query string pairs; unset optional parameters are omitted
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("inputMint", self.input_mint.clone()),
            ("outputMint", self.output_mint.clone()),
            ("amount", self.amount.to_string()),
            ("slippageBps", self.slippage_bps.to_string()),
            ("onlyDirectRoutes", self.only_direct_routes.to_string()),
            ("asLegacyTransaction", self.as_legacy_transaction.to_string()),
        ];
        if let Some(bps) = self.platform_fee_bps {
            pairs.push(("platformFeeBps", bps.to_string()));
        }
        if let Some(ref account) = self.fee_account {
            pairs.push(("feeAccount", account.clone()));
        }
        if !self.exclude_dexes.is_empty() {
            pairs.push(("excludeDexes", self.exclude_dexes.join(",")));
        }
        if let Some(max) = self.max_accounts {
            pairs.push(("maxAccounts", max.to_string()));
        }
        pairs
    }
}

/// Jupiter quote response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    #[serde(default)]
    pub input_mint: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub in_amount: String,
    #[serde(default)]
    pub output_mint: String,
    #[serde(deserialize_with = "string_or_number")]
    pub out_amount: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub other_amount_threshold: String,
    #[serde(default)]
    pub slippage_bps: u16,
    #[serde(default, deserialize_with = "string_or_number")]
    pub price_impact_pct: String,
    #[serde(default)]
    pub route_plan: Vec<RoutePlanStep>,
    /// Everything else, posted back verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl QuoteResponse {
    pub fn in_amount(&self) -> AppResult<u64> {
        parse_amount("inAmount", &self.in_amount)
    }

    pub fn out_amount(&self) -> AppResult<u64> {
        parse_amount("outAmount", &self.out_amount)
    }

    /// Absolute price impact in percent; unparseable values count as zero
    pub fn price_impact_pct(&self) -> f64 {
        self.price_impact_pct
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(f64::abs)
            .unwrap_or(0.0)
    }

    /// Number of hops in the route
    pub fn hops(&self) -> usize {
        self.route_plan.len()
    }

    /// DEX labels along the route
    pub fn route_labels(&self) -> Vec<String> {
        self.route_plan
            .iter()
            .map(|step| step.swap_info.label.clone().unwrap_or_else(|| "unknown".to_string()))
            .collect()
    }
}

/// One leg of a route
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePlanStep {
    pub swap_info: SwapInfo,
    #[serde(default)]
    pub percent: u8,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// AMM details for a route leg
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapInfo {
    #[serde(default)]
    pub amm_key: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Swap request body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequest {
    pub quote_response: QuoteResponse,
    pub user_public_key: String,
    pub wrap_and_unwrap_sol: bool,
    pub dynamic_compute_unit_limit: bool,
    pub as_legacy_transaction: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee_account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prioritization_fee_lamports: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compute_unit_price_micro_lamports: Option<u64>,
}

impl SwapRequest {
    pub fn new(quote: QuoteResponse, user_public_key: String) -> Self {
        Self {
            quote_response: quote,
            user_public_key,
            wrap_and_unwrap_sol: true,
            dynamic_compute_unit_limit: true,
            as_legacy_transaction: false,
            fee_account: None,
            prioritization_fee_lamports: None,
            compute_unit_price_micro_lamports: None,
        }
    }

    pub fn with_priority_fee(mut self, fee: PriorityFee) -> Self {
        match fee {
            PriorityFee::Auto => {
                self.prioritization_fee_lamports = Some("auto".to_string());
                self.compute_unit_price_micro_lamports = None;
            }
            PriorityFee::MicroLamports(price) => {
                self.prioritization_fee_lamports = None;
                self.compute_unit_price_micro_lamports = Some(price);
            }
        }
        self
    }
}

/// Swap response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapResponse {
    /// Swap transaction (base64 encoded)
    pub swap_transaction: String,
    #[serde(default)]
    pub last_valid_block_height: Option<u64>,
    #[serde(default)]
    pub prioritization_fee_lamports: Option<u64>,
}

/// HTTP client for the Jupiter API
pub struct JupiterClient {
    api_url: String,
    http_client: reqwest::Client,
}

impl JupiterClient {
    pub fn new(config: &JupiterConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            api_url: config.api_url.trim_end_matches('/').to_string(),
            http_client,
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

#[async_trait]
impl SwapApi for JupiterClient {
    async fn quote(&self, request: &QuoteRequest) -> AppResult<QuoteResponse> {
        let url = format!("{}/quote", self.api_url);
        tracing::debug!(
            url = %url,
            amount = request.amount,
            slippage_bps = request.slippage_bps,
            "Requesting Jupiter quote"
        );

        let response = self
            .http_client
            .get(&url)
            .query(&request.query_pairs())
            .send()
            .await
            .map_err(|e| request_error("Jupiter quote", e))?;

        let response = check_status("Jupiter quote", response).await?;
        response
            .json::<QuoteResponse>()
            .await
            .map_err(|e| AppError::Parse(format!("Failed to parse Jupiter quote: {}", e)))
    }

    async fn swap_transaction(&self, request: &SwapRequest) -> AppResult<SwapResponse> {
        let url = format!("{}/swap", self.api_url);
        tracing::debug!(url = %url, user = %request.user_public_key, "Requesting Jupiter swap");

        let response = self
            .http_client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| request_error("Jupiter swap", e))?;

        let response = check_status("Jupiter swap", response).await?;
        let swap: SwapResponse = response
            .json()
            .await
            .map_err(|e| AppError::Parse(format!("Failed to parse Jupiter swap: {}", e)))?;

        if swap.swap_transaction.trim().is_empty() {
            return Err(AppError::Parse(
                "Jupiter swap response has an empty swapTransaction".to_string(),
            ));
        }

        Ok(swap)
    }
}

/// True when output never decreases as input grows
pub fn is_monotonic(samples: &[(u64, u64)]) -> bool {
    let mut sorted = samples.to_vec();
    sorted.sort_by_key(|(input, _)| *input);
    sorted.windows(2).all(|pair| pair[1].1 >= pair[0].1)
}

/// Outcome of comparing a quote against one for a larger input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonotonicCheck {
    Monotonic,
    Decreasing,
    /// Routes differ, so the outputs are not comparable
    RouteChanged,
}

impl std::fmt::Display for MonotonicCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Monotonic => write!(f, "monotonic"),
            Self::Decreasing => write!(f, "NOT monotonic"),
            Self::RouteChanged => write!(f, "route changed"),
        }
    }
}

/// Compare two quotes along the same route
pub fn check_monotonic(
    smaller: (u64, &QuoteResponse),
    larger: (u64, &QuoteResponse),
) -> AppResult<MonotonicCheck> {
    if smaller.1.route_labels() != larger.1.route_labels() {
        return Ok(MonotonicCheck::RouteChanged);
    }
    let samples = [
        (smaller.0, smaller.1.out_amount()?),
        (larger.0, larger.1.out_amount()?),
    ];
    Ok(if is_monotonic(&samples) {
        MonotonicCheck::Monotonic
    } else {
        MonotonicCheck::Decreasing
    })
}

fn request_error(context: &str, e: reqwest::Error) -> AppError {
    if e.is_timeout() {
        AppError::Timeout(format!("{} request timed out: {}", context, e))
    } else {
        AppError::Http(format!("{} request failed: {}", context, e))
    }
}

async fn check_status(context: &str, response: reqwest::Response) -> AppResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::warn!(status = %status, body = %body, "{} returned error", context);

    // 4xx (other than rate limiting) will not succeed on retry
    if status.is_client_error() && status != reqwest::StatusCode::TOO_MANY_REQUESTS {
        Err(AppError::Validation(format!(
            "{} rejected ({}): {}",
            context, status, body
        )))
    } else {
        Err(AppError::Http(format!("{} returned {}: {}", context, status, body)))
    }
}

fn parse_amount(field: &str, raw: &str) -> AppResult<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|e| AppError::Parse(format!("Invalid {} '{}': {}", field, raw, e)))
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}
