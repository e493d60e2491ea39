//! Wallet helpers
//!
//! Parses and validates the base58 keypair and fee settings, and writes a
//! freshly generated keypair into a `.env` file.

use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};
use std::path::Path;
use std::str::FromStr;

use crate::constants::{KEYPAIR_LENGTH, MAX_BASIS_POINTS};
use crate::error::{AppError, AppResult};

/// Environment variable the keypair is stored under
pub const PRIVATE_KEY_VAR: &str = "PRIVATE_KEY";

/// Parse a base58 encoded 64-byte secret key
pub fn parse_private_key(encoded: &str) -> AppResult<Keypair> {
    let encoded = encoded.trim();
    if encoded.is_empty() {
        return Err(AppError::Validation("Private key is empty".to_string()));
    }

    let key_bytes = bs58::decode(encoded)
        .into_vec()
        .map_err(|e| AppError::Validation(format!("Invalid base58 private key: {}", e)))?;

    if key_bytes.len() != KEYPAIR_LENGTH {
        return Err(AppError::Validation(format!(
            "Invalid keypair length (expected {} bytes, got {})",
            KEYPAIR_LENGTH,
            key_bytes.len()
        )));
    }

    Keypair::from_bytes(&key_bytes)
        .map_err(|e| AppError::Validation(format!("Invalid keypair bytes: {}", e)))
}

/// Parse a base58 public key
pub fn parse_pubkey(encoded: &str) -> AppResult<Pubkey> {
    Pubkey::from_str(encoded.trim())
        .map_err(|e| AppError::Validation(format!("Invalid public key '{}': {}", encoded, e)))
}

/// Accept fee basis points within 0..=10000
pub fn validate_fee_bps(bps: i64) -> AppResult<u16> {
    if (0..=i64::from(MAX_BASIS_POINTS)).contains(&bps) {
        Ok(bps as u16)
    } else {
        Err(AppError::Validation(format!(
            "Fee basis points must be within 0..={}, got {}",
            MAX_BASIS_POINTS, bps
        )))
    }
}

/// Generate a new random keypair
pub fn generate_keypair() -> Keypair {
    Keypair::new()
}

/// Base58 encode the full 64-byte keypair
pub fn encode_private_key(keypair: &Keypair) -> String {
    bs58::encode(keypair.to_bytes()).into_string()
}

/// Write `PRIVATE_KEY=<base58>` into an env file
///
/// Other lines are preserved. An existing key is only replaced when `force`
/// is set.
pub fn write_private_key(path: &Path, keypair: &Keypair, force: bool) -> AppResult<()> {
    let existing = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };

    let assignment = format!("{}={}", PRIVATE_KEY_VAR, encode_private_key(keypair));
    let mut replaced = false;
    let mut lines = Vec::new();

    for line in existing.lines() {
        if is_private_key_line(line) {
            if !force {
                return Err(AppError::Validation(format!(
                    "{} already contains {}; pass --force to replace it",
                    path.display(),
                    PRIVATE_KEY_VAR
                )));
            }
            if !replaced {
                lines.push(assignment.clone());
                replaced = true;
            }
            continue;
        }
        lines.push(line.to_string());
    }

    if !replaced {
        lines.push(assignment);
    }

    let mut content = lines.join("\n");
    content.push('\n');
    std::fs::write(path, content)?;

    tracing::info!(
        path = %path.display(),
        pubkey = %keypair.pubkey(),
        "Wallet keypair written"
    );

    Ok(())
}

fn is_private_key_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
    trimmed
        .split_once('=')
        .map(|(name, _)| name.trim() == PRIVATE_KEY_VAR)
        .unwrap_or(false)
}
