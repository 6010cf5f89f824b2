//! Error types for the Splitter ledger.

use splitter_core::{Amount, Identity, TransferError};
use splitter_perms::PermsError;
use splitter_store::StoreError;
use thiserror::Error;

/// Errors that can occur during ledger operations.
///
/// Every error aborts the whole operation: no state change and no events.
#[derive(Debug, Error)]
pub enum SplitterError {
    /// Caller is not the current owner.
    #[error("unauthorized: {caller} is not the owner")]
    Unauthorized { caller: Identity },

    /// A fund-moving operation was attempted while paused.
    #[error("contract is paused")]
    ContractPaused,

    /// A split recipient is null, or both recipients are the same identity.
    #[error("invalid recipients: {first} and {second}")]
    InvalidRecipient { first: Identity, second: Identity },

    /// Attached value cannot produce two non-zero shares.
    #[error("insufficient value: {value} cannot be split")]
    InsufficientValue { value: Amount },

    /// Value attached to an operation that does not accept value.
    #[error("unexpected value: {value} attached to a non-payable operation")]
    UnexpectedValue { value: Amount },

    /// Caller has no credited balance.
    #[error("nothing to withdraw for {caller}")]
    NothingToWithdraw { caller: Identity },

    /// The value-transfer primitive failed; the withdrawal was rolled back.
    #[error("transfer failed: {0}")]
    TransferFailed(#[from] TransferError),

    /// Value was sent to the ledger without selecting an operation.
    #[error("direct transfers are not accepted (value {value})")]
    DirectTransfer { value: Amount },

    /// A credit would exceed the representable amount.
    #[error("amount overflow")]
    Overflow,

    /// The store already holds a deployed ledger.
    #[error("ledger already deployed")]
    AlreadyDeployed,

    /// The store holds no deployed ledger.
    #[error("ledger not deployed")]
    NotDeployed,

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// Discriminant of [`SplitterError`], convenient for matching and assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Unauthorized,
    ContractPaused,
    InvalidRecipient,
    InsufficientValue,
    UnexpectedValue,
    NothingToWithdraw,
    TransferFailed,
    DirectTransfer,
    Overflow,
    AlreadyDeployed,
    NotDeployed,
    Store,
}

impl SplitterError {
    /// The kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SplitterError::Unauthorized { .. } => ErrorKind::Unauthorized,
            SplitterError::ContractPaused => ErrorKind::ContractPaused,
            SplitterError::InvalidRecipient { .. } => ErrorKind::InvalidRecipient,
            SplitterError::InsufficientValue { .. } => ErrorKind::InsufficientValue,
            SplitterError::UnexpectedValue { .. } => ErrorKind::UnexpectedValue,
            SplitterError::NothingToWithdraw { .. } => ErrorKind::NothingToWithdraw,
            SplitterError::TransferFailed(_) => ErrorKind::TransferFailed,
            SplitterError::DirectTransfer { .. } => ErrorKind::DirectTransfer,
            SplitterError::Overflow => ErrorKind::Overflow,
            SplitterError::AlreadyDeployed => ErrorKind::AlreadyDeployed,
            SplitterError::NotDeployed => ErrorKind::NotDeployed,
            SplitterError::Store(_) => ErrorKind::Store,
        }
    }
}

impl From<PermsError> for SplitterError {
    fn from(e: PermsError) -> Self {
        match e {
            PermsError::Unauthorized { caller } => SplitterError::Unauthorized { caller },
            PermsError::ContractPaused => SplitterError::ContractPaused,
        }
    }
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, SplitterError>;
