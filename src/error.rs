//! Error types for the swap operator

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Validation error (bad key, fee bps, pubkey, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Wallet cannot cover the swap
    #[error("Insufficient balance: required {required} lamports, available {available} lamports")]
    InsufficientBalance { required: u64, available: u64 },

    /// Jupiter / Helius HTTP failure
    #[error("HTTP error: {0}")]
    Http(String),

    /// Response or payload could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),

    /// RPC/Solana error
    #[error("RPC error: {0}")]
    Rpc(String),

    /// Transaction simulation reported an error
    #[error("Simulation failed: {0}")]
    Simulation(String),

    /// Transaction landed with an error or never confirmed
    #[error("Confirmation failed: {0}")]
    Confirmation(String),

    /// Operation timed out
    #[error("Timed out: {0}")]
    Timeout(String),

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether a bounded retry may succeed where this attempt failed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Rpc(_) | Self::Timeout(_))
    }

    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InsufficientBalance { .. } => StatusCode::BAD_REQUEST,
            Self::Http(_) | Self::Rpc(_) | Self::Parse(_) => StatusCode::BAD_GATEWAY,
            Self::Simulation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Confirmation(_) | Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::Config(_) | Self::Io(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable reason
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Config(_) => "configuration_error",
            Self::Validation(_) => "validation_failed",
            Self::InsufficientBalance { .. } => "insufficient_balance",
            Self::Http(_) => "upstream_http_error",
            Self::Parse(_) => "upstream_parse_error",
            Self::Rpc(_) => "rpc_error",
            Self::Simulation(_) => "simulation_failed",
            Self::Confirmation(_) => "confirmation_failed",
            Self::Timeout(_) => "timeout",
            Self::Io(_) => "io_error",
            Self::Internal(_) => "internal_error",
        }
    }
}

/// Error response structure for API
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub reason: &'static str,
    pub logs: Vec<String>,
}

impl ErrorResponse {
    pub fn new(error: &AppError, logs: Vec<String>) -> Self {
        Self {
            error: error.to_string(),
            reason: error.reason(),
            logs,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        tracing::error!(
            error_type = %self,
            status_code = %status_code,
            "Request error"
        );

        (status_code, Json(ErrorResponse::new(&self, Vec::new()))).into_response()
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
