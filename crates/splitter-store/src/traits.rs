//! LedgerStore trait: the abstract interface for ledger persistence.
//!
//! This trait allows the ledger to be storage-agnostic. Implementations
//! include SQLite (durable) and in-memory (for tests).

use splitter_core::{Amount, Identity};

use crate::error::{Result, StoreError};

/// Persisted owner and pause state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlRecord {
    /// The current owner.
    pub owner: Identity,
    /// Whether fund-moving operations are blocked.
    pub paused: bool,
}

/// Handle to an open savepoint.
///
/// Savepoints nest strictly: the most recently opened one must be released
/// or rolled back first.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a savepoint must be released or rolled back"]
pub struct Savepoint {
    depth: usize,
}

impl Savepoint {
    pub(crate) fn new(depth: usize) -> Self {
        Self { depth }
    }

    /// Nesting depth, starting at 1 for the outermost savepoint.
    pub fn depth(&self) -> usize {
        self.depth
    }
}

/// The LedgerStore trait: synchronous interface for ledger persistence.
///
/// Methods take `&self`; implementations use interior mutability so a store
/// can be shared behind the ledger while a payout callback re-enters it.
///
/// # Design Notes
///
/// - **Default zero**: an identity that was never credited reads zero.
/// - **No removal**: withdrawn entries are kept with a zero amount.
/// - **Savepoints**: `savepoint` snapshots every piece of ledger state;
///   `rollback_to` restores it, `release` keeps the changes.
pub trait LedgerStore: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Balance Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Get the credited balance of an identity.
    fn balance(&self, who: &Identity) -> Result<Amount>;

    /// Overwrite the credited balance of an identity.
    fn set_balance(&self, who: &Identity, amount: Amount) -> Result<()>;

    /// All recorded entries, ordered by identity.
    fn balances(&self) -> Result<Vec<(Identity, Amount)>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Contract Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Total value currently held on behalf of recipients.
    fn held(&self) -> Result<Amount>;

    /// Overwrite the held value.
    fn set_held(&self, amount: Amount) -> Result<()>;

    /// Get the owner and pause record, if the ledger was deployed.
    fn control(&self) -> Result<Option<ControlRecord>>;

    /// Insert or replace the owner and pause record.
    fn put_control(&self, record: &ControlRecord) -> Result<()>;

    // ─────────────────────────────────────────────────────────────────────────
    // Savepoints
    // ─────────────────────────────────────────────────────────────────────────

    /// Open a nested savepoint.
    fn savepoint(&self) -> Result<Savepoint>;

    /// Keep all changes made since `savepoint` was opened.
    fn release(&self, savepoint: Savepoint) -> Result<()>;

    /// Discard all changes made since `savepoint` was opened.
    fn rollback_to(&self, savepoint: Savepoint) -> Result<()>;
}

/// Extension trait for common store patterns.
pub trait LedgerStoreExt: LedgerStore {
    /// Sum of all recorded balances.
    fn outstanding(&self) -> Result<Amount> {
        self.balances()?
            .into_iter()
            .try_fold(0 as Amount, |acc, (_, amount)| acc.checked_add(amount))
            .ok_or_else(|| StoreError::InvalidData("outstanding balances overflow".into()))
    }

    /// Whether the held value equals the sum of recorded balances.
    fn is_conserved(&self) -> Result<bool> {
        Ok(self.held()? == self.outstanding()?)
    }
}

impl<S: LedgerStore + ?Sized> LedgerStoreExt for S {}
