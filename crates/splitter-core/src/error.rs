//! Error types for the Splitter core.

use thiserror::Error;

use crate::types::{Amount, Identity};

/// Core errors raised while encoding or decoding ledger primitives.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),
}

/// Failure reported by the external value-transfer primitive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("transfer of {amount} to {to} failed: {reason}")]
pub struct TransferError {
    /// Intended recipient of the payout.
    pub to: Identity,
    /// Amount that could not be moved.
    pub amount: Amount,
    /// Reason given by the environment.
    pub reason: String,
}

impl TransferError {
    pub fn new(to: Identity, amount: Amount, reason: impl Into<String>) -> Self {
        Self {
            to,
            amount,
            reason: reason.into(),
        }
    }
}
