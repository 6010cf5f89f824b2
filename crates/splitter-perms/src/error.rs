//! Error types for the permissions module.

use thiserror::Error;

use splitter_core::Identity;

/// Errors that can occur during permission checks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermsError {
    /// Caller is not the current owner.
    #[error("unauthorized: {caller} is not the owner")]
    Unauthorized { caller: Identity },

    /// A fund-moving operation was attempted while paused.
    #[error("contract is paused")]
    ContractPaused,
}

/// Result type for permission operations.
pub type Result<T> = std::result::Result<T, PermsError>;
