//! Transaction builder for Jupiter swaps
//!
//! Jupiter returns the swap as a base64 wire-format transaction with
//! placeholder signatures. This decodes it, signs it with the wallet keypair
//! and re-encodes it for display or submission.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use solana_sdk::{
    message::VersionedMessage,
    signature::{Keypair, Signer},
    transaction::VersionedTransaction,
};

use crate::error::{AppError, AppResult};

/// Decode a base64 `swapTransaction`
pub fn decode_swap_transaction(encoded: &str) -> AppResult<VersionedTransaction> {
    let tx_bytes = BASE64
        .decode(encoded.trim())
        .map_err(|e| AppError::Parse(format!("Failed to decode transaction: {}", e)))?;

    if tx_bytes.is_empty() {
        return Err(AppError::Parse("Transaction bytes are empty".to_string()));
    }

    tracing::debug!(tx_bytes_len = tx_bytes.len(), "Decoded transaction from Jupiter");

    // Solana wire format is bincode 1.x
    bincode1::deserialize::<VersionedTransaction>(&tx_bytes)
        .map_err(|e| AppError::Parse(format!("Failed to deserialize transaction: {}", e)))
}

/// Sign `transaction` with `keypair`, replacing Jupiter's placeholder signature
pub fn sign_transaction(
    transaction: VersionedTransaction,
    keypair: &Keypair,
) -> AppResult<VersionedTransaction> {
    let fee_payer = transaction.message.static_account_keys().first().copied();
    if fee_payer != Some(keypair.pubkey()) {
        return Err(AppError::Validation(format!(
            "Transaction fee payer {:?} does not match wallet {}",
            fee_payer,
            keypair.pubkey()
        )));
    }

    let version = match transaction.message {
        VersionedMessage::Legacy(_) => "legacy",
        VersionedMessage::V0(_) => "v0",
    };
    tracing::debug!(version, "Signing swap transaction");

    VersionedTransaction::try_new(transaction.message, &[keypair])
        .map_err(|e| AppError::Validation(format!("Signing failed: {}", e)))
}

/// Decode and sign in one step
pub fn build_signed_transaction(
    encoded: &str,
    keypair: &Keypair,
) -> AppResult<VersionedTransaction> {
    let transaction = decode_swap_transaction(encoded)?;
    sign_transaction(transaction, keypair)
}

/// Encode a transaction as base64 wire format
pub fn encode_transaction(transaction: &VersionedTransaction) -> AppResult<String> {
    let bytes = bincode1::serialize(transaction)
        .map_err(|e| AppError::Parse(format!("Failed to serialize transaction: {}", e)))?;
    Ok(BASE64.encode(bytes))
}
