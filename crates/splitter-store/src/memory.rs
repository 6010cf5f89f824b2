//! In-memory implementation of the LedgerStore trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use splitter_core::{Amount, Identity};

use crate::error::{Result, StoreError};
use crate::traits::{ControlRecord, LedgerStore, Savepoint};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
#[derive(Debug)]
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Debug)]
struct MemoryStoreInner {
    /// Live ledger state.
    state: LedgerState,

    /// Snapshots taken at each open savepoint, outermost first.
    savepoints: Vec<LedgerState>,
}

#[derive(Debug, Clone, Default)]
struct LedgerState {
    /// Credited balances.
    balances: BTreeMap<Identity, Amount>,

    /// Value held on behalf of recipients.
    held: Amount,

    /// Owner and pause record.
    control: Option<ControlRecord>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner {
                state: LedgerState::default(),
                savepoints: Vec::new(),
            }),
        }
    }

    /// Number of currently open savepoints.
    pub fn open_savepoints(&self) -> Result<usize> {
        Ok(self.read()?.savepoints.len())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStoreInner {
    /// Pop the innermost snapshot, checking it belongs to `savepoint`.
    fn pop_savepoint(&mut self, savepoint: &Savepoint) -> Result<LedgerState> {
        if self.savepoints.len() != savepoint.depth() {
            return Err(StoreError::Savepoint(format!(
                "savepoint {} is not the innermost (open: {})",
                savepoint.depth(),
                self.savepoints.len()
            )));
        }
        self.savepoints
            .pop()
            .ok_or_else(|| StoreError::Savepoint("no open savepoint".into()))
    }
}

impl LedgerStore for MemoryStore {
    fn balance(&self, who: &Identity) -> Result<Amount> {
        let inner = self.read()?;
        Ok(inner.state.balances.get(who).copied().unwrap_or(0))
    }

    fn set_balance(&self, who: &Identity, amount: Amount) -> Result<()> {
        let mut inner = self.write()?;
        inner.state.balances.insert(*who, amount);
        Ok(())
    }

    fn balances(&self) -> Result<Vec<(Identity, Amount)>> {
        let inner = self.read()?;
        Ok(inner
            .state
            .balances
            .iter()
            .map(|(who, amount)| (*who, *amount))
            .collect())
    }

    fn held(&self) -> Result<Amount> {
        Ok(self.read()?.state.held)
    }

    fn set_held(&self, amount: Amount) -> Result<()> {
        self.write()?.state.held = amount;
        Ok(())
    }

    fn control(&self) -> Result<Option<ControlRecord>> {
        Ok(self.read()?.state.control)
    }

    fn put_control(&self, record: &ControlRecord) -> Result<()> {
        self.write()?.state.control = Some(*record);
        Ok(())
    }

    fn savepoint(&self) -> Result<Savepoint> {
        let mut inner = self.write()?;
        let snapshot = inner.state.clone();
        inner.savepoints.push(snapshot);
        Ok(Savepoint::new(inner.savepoints.len()))
    }

    fn release(&self, savepoint: Savepoint) -> Result<()> {
        let mut inner = self.write()?;
        inner.pop_savepoint(&savepoint)?;
        Ok(())
    }

    fn rollback_to(&self, savepoint: Savepoint) -> Result<()> {
        let mut inner = self.write()?;
        let snapshot = inner.pop_savepoint(&savepoint)?;
        inner.state = snapshot;
        Ok(())
    }
}
