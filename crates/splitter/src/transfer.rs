//! The external value-transfer primitive.
//!
//! Moving native value is the environment's job. The ledger only asks for a
//! payout and learns whether it succeeded. Because the primitive receives
//! the ledger itself, it can re-enter any operation before returning; this
//! is how reentrancy is modeled.

use splitter_core::{Amount, Identity, TransferError};
use splitter_store::LedgerStore;

use crate::ledger::Splitter;

/// Moves `amount` of native value from the ledger to `to`.
pub trait ValueTransfer<S: LedgerStore> {
    /// Pay `amount` to `to`.
    ///
    /// `ledger` is the ledger performing the payout. Implementations may call
    /// back into it; any such call sees the ledger state as already updated
    /// for the payout in progress.
    fn transfer(
        &mut self,
        ledger: &mut Splitter<S>,
        to: &Identity,
        amount: Amount,
    ) -> Result<(), TransferError>;
}

impl<S, F> ValueTransfer<S> for F
where
    S: LedgerStore,
    F: FnMut(&mut Splitter<S>, &Identity, Amount) -> Result<(), TransferError>,
{
    fn transfer(
        &mut self,
        ledger: &mut Splitter<S>,
        to: &Identity,
        amount: Amount,
    ) -> Result<(), TransferError> {
        self(ledger, to, amount)
    }
}
