//! The Splitter: a two-way payment splitting ledger.
//!
//! The Splitter brings together the pause controller (and through it the
//! ownership guard), the ledger store and the external value-transfer
//! primitive.
//!
//! Every mutating operation runs inside a store savepoint. Any failure rolls
//! the store and the in-memory control state back to where the operation
//! started, so callers observe all of an operation's effects or none.

use splitter_core::{Amount, Call, Event, Identity};
use splitter_perms::{Owned, Pausable};
use splitter_store::{ControlRecord, LedgerStore, LedgerStoreExt, StoreError};

use crate::config::SplitterConfig;
use crate::error::{Result, SplitterError};
use crate::transfer::ValueTransfer;

/// Smallest value `split` accepts: one unit for each recipient.
pub const MIN_SPLIT_VALUE: Amount = 2;

/// The main Splitter struct.
///
/// Provides:
/// - Splitting incoming value between two recipients
/// - Full-balance withdrawals, safe against reentrant payouts
/// - Owner-only administration (ownership transfer, pause)
pub struct Splitter<S: LedgerStore> {
    /// The storage backend.
    store: S,
    /// Owner and pause flag, mirrored to the store on every change.
    control: Pausable,
}

impl<S: LedgerStore> Splitter<S> {
    /// Deploy a new ledger into an empty store, owned by `deployer`.
    pub fn deploy(store: S, deployer: Identity, config: SplitterConfig) -> Result<Self> {
        if store.control()?.is_some() {
            return Err(SplitterError::AlreadyDeployed);
        }

        let control = Pausable::new(deployer, config.start_paused);
        store.put_control(&control_record(&control))?;

        tracing::info!(owner = %deployer, paused = config.start_paused, "ledger deployed");
        Ok(Self { store, control })
    }

    /// Open a ledger previously deployed into `store`.
    pub fn open(store: S) -> Result<Self> {
        let record = store.control()?.ok_or(SplitterError::NotDeployed)?;
        let control = Pausable::from_parts(Owned::new(record.owner), record.paused);

        tracing::debug!(owner = %record.owner, paused = record.paused, "ledger opened");
        Ok(Self { store, control })
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consume the ledger, returning its store.
    pub fn into_store(self) -> S {
        self.store
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Read Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// The current owner.
    pub fn owner(&self) -> Identity {
        self.control.owner()
    }

    /// Whether `split` is currently blocked.
    pub fn is_paused(&self) -> bool {
        self.control.is_paused()
    }

    /// Credited, not yet withdrawn balance of `who`.
    pub fn balance_of(&self, who: &Identity) -> Result<Amount> {
        Ok(self.store.balance(who)?)
    }

    /// Total value the ledger holds on behalf of recipients.
    pub fn held_value(&self) -> Result<Amount> {
        Ok(self.store.held()?)
    }

    /// Whether the held value equals the sum of all outstanding balances.
    pub fn is_conserved(&self) -> Result<bool> {
        Ok(self.store.is_conserved()?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Administration
    // ─────────────────────────────────────────────────────────────────────────

    /// Transfer ownership. Owner only.
    pub fn set_owner(&mut self, caller: &Identity, new_owner: Identity) -> Result<Vec<Event>> {
        let previous_owner = self.control.owner();
        let mut next = self.control;
        let event = next.set_owner(caller, new_owner)?;
        self.commit_control(next)?;

        tracing::info!(%previous_owner, %new_owner, "owner set");
        Ok(vec![event])
    }

    /// Pause or unpause `split`. Owner only.
    pub fn set_paused(&mut self, caller: &Identity, paused: bool) -> Result<Vec<Event>> {
        let mut next = self.control;
        let event = next.set_paused(caller, paused)?;
        self.commit_control(next)?;

        tracing::info!(sender = %caller, paused, "paused state set");
        Ok(vec![event])
    }

    fn commit_control(&mut self, next: Pausable) -> Result<()> {
        self.store.put_control(&control_record(&next))?;
        self.control = next;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Fund Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Split the value attached to `call` between `first` and `second`.
    ///
    /// `first` is credited `value / 2` and `second` the remainder, so an odd
    /// unit always goes to `second`. Anyone may call this.
    pub fn split(&mut self, call: &Call, first: &Identity, second: &Identity) -> Result<Vec<Event>> {
        self.control.require_not_paused()?;

        if first.is_null() || second.is_null() || first == second {
            return Err(SplitterError::InvalidRecipient {
                first: *first,
                second: *second,
            });
        }
        if call.value < MIN_SPLIT_VALUE {
            return Err(SplitterError::InsufficientValue { value: call.value });
        }

        let half = call.value / 2;
        let rest = call.value - half;

        let first_balance = self
            .store
            .balance(first)?
            .checked_add(half)
            .ok_or(SplitterError::Overflow)?;
        let second_balance = self
            .store
            .balance(second)?
            .checked_add(rest)
            .ok_or(SplitterError::Overflow)?;
        let held = self
            .store
            .held()?
            .checked_add(call.value)
            .ok_or(SplitterError::Overflow)?;

        self.atomically(|ledger| {
            ledger.store.set_balance(first, first_balance)?;
            ledger.store.set_balance(second, second_balance)?;
            ledger.store.set_held(held)?;
            Ok(())
        })?;

        tracing::debug!(
            sender = %call.caller,
            %first,
            %second,
            amount = call.value,
            "split accepted"
        );
        Ok(vec![Event::Split {
            sender: call.caller,
            first: *first,
            second: *second,
            amount: call.value,
        }])
    }

    /// A plain value transfer that names no operation. Always rejected.
    pub fn receive(&mut self, call: &Call) -> Result<Vec<Event>> {
        tracing::debug!(sender = %call.caller, value = call.value, "direct transfer rejected");
        Err(SplitterError::DirectTransfer { value: call.value })
    }

    /// Pay the caller's full balance out through `transfer`.
    ///
    /// The balance is zeroed before `transfer` runs, so a reentrant
    /// `withdraw` from the same caller finds nothing to withdraw. If the
    /// transfer fails, `amount` is credited back to the caller. Nested
    /// operations that completed during the transfer stand.
    pub fn withdraw<T>(&mut self, call: &Call, transfer: &mut T) -> Result<Vec<Event>>
    where
        T: ValueTransfer<S> + ?Sized,
    {
        if call.has_value() {
            return Err(SplitterError::UnexpectedValue { value: call.value });
        }

        let caller = call.caller;
        let amount = self.store.balance(&caller)?;
        if amount == 0 {
            return Err(SplitterError::NothingToWithdraw { caller });
        }

        let held = self.store.held()?.checked_sub(amount).ok_or_else(|| {
            StoreError::InvalidData(format!(
                "held value is below the balance of {} ({})",
                caller, amount
            ))
        })?;

        self.atomically(|ledger| {
            ledger.store.set_balance(&caller, 0)?;
            ledger.store.set_held(held)?;
            Ok(())
        })?;

        if let Err(e) = transfer.transfer(self, &caller, amount) {
            tracing::warn!(%caller, amount, error = %e, "payout failed, restoring balance");
            self.recredit(&caller, amount)?;
            return Err(SplitterError::TransferFailed(e));
        }

        tracing::info!(%caller, amount, "withdrawn");
        Ok(vec![Event::Withdrawn {
            sender: caller,
            balance: amount,
        }])
    }

    /// Put `amount` back into `who`'s entry and the held value.
    fn recredit(&mut self, who: &Identity, amount: Amount) -> Result<()> {
        let balance = self
            .store
            .balance(who)?
            .checked_add(amount)
            .ok_or(SplitterError::Overflow)?;
        let held = self
            .store
            .held()?
            .checked_add(amount)
            .ok_or(SplitterError::Overflow)?;

        self.atomically(|ledger| {
            ledger.store.set_balance(who, balance)?;
            ledger.store.set_held(held)?;
            Ok(())
        })
    }

    /// Run `f` inside a savepoint, reverting store and control state on error.
    fn atomically<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        let savepoint = self.store.savepoint()?;
        let control = self.control;

        match f(self) {
            Ok(value) => {
                self.store.release(savepoint)?;
                Ok(value)
            }
            Err(err) => {
                self.control = control;
                if let Err(rollback) = self.store.rollback_to(savepoint) {
                    tracing::error!(error = %rollback, cause = %err, "rollback failed");
                    return Err(rollback.into());
                }
                Err(err)
            }
        }
    }
}

fn control_record(control: &Pausable) -> ControlRecord {
    ControlRecord {
        owner: control.owner(),
        paused: control.is_paused(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use proptest::prelude::*;
    use splitter_core::TransferError;
    use splitter_store::{MemoryStore, Savepoint};
    use std::io;
    use std::sync::{Arc, Mutex};

    fn owner() -> Identity {
        Identity::derive("owner")
    }

    fn first() -> Identity {
        Identity::derive("first")
    }

    fn second() -> Identity {
        Identity::derive("second")
    }

    fn deploy() -> Splitter<MemoryStore> {
        Splitter::deploy(MemoryStore::new(), owner(), SplitterConfig::default()).unwrap()
    }

    fn pay_ok(
        _: &mut Splitter<MemoryStore>,
        _: &Identity,
        _: Amount,
    ) -> std::result::Result<(), TransferError> {
        Ok(())
    }

    fn pay_fail(
        _: &mut Splitter<MemoryStore>,
        to: &Identity,
        amount: Amount,
    ) -> std::result::Result<(), TransferError> {
        Err(TransferError::new(*to, amount, "recipient rejected payment"))
    }

    /// A `MemoryStore` that refuses to write the control record.
    struct FrozenControl(MemoryStore);

    impl LedgerStore for FrozenControl {
        fn balance(&self, who: &Identity) -> splitter_store::Result<Amount> {
            self.0.balance(who)
        }

        fn set_balance(&self, who: &Identity, amount: Amount) -> splitter_store::Result<()> {
            self.0.set_balance(who, amount)
        }

        fn balances(&self) -> splitter_store::Result<Vec<(Identity, Amount)>> {
            self.0.balances()
        }

        fn held(&self) -> splitter_store::Result<Amount> {
            self.0.held()
        }

        fn set_held(&self, amount: Amount) -> splitter_store::Result<()> {
            self.0.set_held(amount)
        }

        fn control(&self) -> splitter_store::Result<Option<ControlRecord>> {
            self.0.control()
        }

        fn put_control(&self, _: &ControlRecord) -> splitter_store::Result<()> {
            Err(StoreError::InvalidData("control record is frozen".into()))
        }

        fn savepoint(&self) -> splitter_store::Result<Savepoint> {
            self.0.savepoint()
        }

        fn release(&self, savepoint: Savepoint) -> splitter_store::Result<()> {
            self.0.release(savepoint)
        }

        fn rollback_to(&self, savepoint: Savepoint) -> splitter_store::Result<()> {
            self.0.rollback_to(savepoint)
        }
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Run `f` with a subscriber installed and return everything it logged.
    fn capture_logs(f: impl FnOnce()) -> String {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, f);

        let bytes = buffer.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    proptest! {
        #[test]
        fn test_split_then_withdraw_conserves(value in 2u128..=1_000_000, first_wins in any::<bool>()) {
            let mut ledger = deploy();
            ledger
                .split(&Call::new(owner()).with_value(value), &first(), &second())
                .unwrap();

            let who = if first_wins { first() } else { second() };
            let owed = ledger.balance_of(&who).unwrap();
            ledger.withdraw(&Call::new(who), &mut pay_ok).unwrap();

            prop_assert_eq!(ledger.held_value().unwrap(), value - owed);
            prop_assert!(ledger.is_conserved().unwrap());
        }
    }

    #[test]
    fn test_deploy_defaults() {
        let ledger = deploy();
        assert_eq!(ledger.owner(), owner());
        assert!(!ledger.is_paused());
        assert_eq!(ledger.balance_of(&first()).unwrap(), 0);
        assert_eq!(ledger.held_value().unwrap(), 0);
    }

    #[test]
    fn test_deploy_twice_fails() {
        let ledger = deploy();
        let store = ledger.into_store();
        let err = Splitter::deploy(store, owner(), SplitterConfig::default())
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::AlreadyDeployed);
    }

    #[test]
    fn test_open_requires_deployment() {
        let err = Splitter::open(MemoryStore::new()).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::NotDeployed);
    }

    #[test]
    fn test_split_odd_value() {
        let mut ledger = deploy();

        let events = ledger
            .split(&Call::new(owner()).with_value(99), &first(), &second())
            .unwrap();

        assert_eq!(ledger.balance_of(&first()).unwrap(), 49);
        assert_eq!(ledger.balance_of(&second()).unwrap(), 50);
        assert_eq!(ledger.held_value().unwrap(), 99);
        assert_eq!(
            events,
            vec![Event::Split {
                sender: owner(),
                first: first(),
                second: second(),
                amount: 99
            }]
        );
    }

    #[test]
    fn test_split_accumulates() {
        let mut ledger = deploy();
        let call = Call::new(owner()).with_value(10);

        ledger.split(&call, &first(), &second()).unwrap();
        ledger.split(&call, &second(), &first()).unwrap();

        assert_eq!(ledger.balance_of(&first()).unwrap(), 10);
        assert_eq!(ledger.balance_of(&second()).unwrap(), 10);
        assert!(ledger.is_conserved().unwrap());
    }

    #[test]
    fn test_split_precondition_order() {
        let mut ledger = deploy();
        ledger.set_paused(&owner(), true).unwrap();

        // Paused wins over every other problem.
        let err = ledger
            .split(&Call::new(owner()), &Identity::ZERO, &Identity::ZERO)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ContractPaused);

        ledger.set_paused(&owner(), false).unwrap();

        // Recipients are checked before value.
        let err = ledger
            .split(&Call::new(owner()), &first(), &first())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRecipient);

        let err = ledger
            .split(&Call::new(owner()).with_value(1), &first(), &second())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientValue);
    }

    #[test]
    fn test_split_rejects_null_recipients() {
        let mut ledger = deploy();
        let call = Call::new(owner()).with_value(1000);

        for (a, b) in [(Identity::ZERO, second()), (first(), Identity::ZERO)] {
            let err = ledger.split(&call, &a, &b).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidRecipient);
        }
        assert_eq!(ledger.held_value().unwrap(), 0);
    }

    #[test]
    fn test_split_overflow_is_atomic() {
        let mut ledger = deploy();
        ledger
            .split(&Call::new(owner()).with_value(u128::MAX), &first(), &second())
            .unwrap();

        let err = ledger
            .split(&Call::new(owner()).with_value(2), &first(), &second())
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Overflow);
        assert_eq!(ledger.balance_of(&first()).unwrap(), u128::MAX / 2);
        assert_eq!(ledger.held_value().unwrap(), u128::MAX);
    }

    #[test]
    fn test_receive_always_fails() {
        let mut ledger = deploy();
        for value in [0, 1, 100] {
            let err = ledger
                .receive(&Call::new(owner()).with_value(value))
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::DirectTransfer);
        }
    }

    #[test]
    fn test_withdraw() {
        let mut ledger = deploy();
        ledger
            .split(&Call::new(owner()).with_value(4001), &first(), &second())
            .unwrap();

        let events = ledger.withdraw(&Call::new(first()), &mut pay_ok).unwrap();

        assert_eq!(
            events,
            vec![Event::Withdrawn {
                sender: first(),
                balance: 2000
            }]
        );
        assert_eq!(ledger.balance_of(&first()).unwrap(), 0);
        assert_eq!(ledger.held_value().unwrap(), 2001);

        let err = ledger.withdraw(&Call::new(first()), &mut pay_ok).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NothingToWithdraw);
    }

    #[test]
    fn test_withdraw_with_value_rejected() {
        let mut ledger = deploy();
        ledger
            .split(&Call::new(owner()).with_value(4001), &first(), &second())
            .unwrap();

        let err = ledger
            .withdraw(&Call::new(first()).with_value(1), &mut pay_ok)
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UnexpectedValue);
        assert_eq!(ledger.balance_of(&first()).unwrap(), 2000);
    }

    #[test]
    fn test_owner_without_balance_cannot_withdraw() {
        let mut ledger = deploy();
        ledger
            .split(&Call::new(owner()).with_value(4001), &first(), &second())
            .unwrap();

        let err = ledger.withdraw(&Call::new(owner()), &mut pay_ok).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NothingToWithdraw);
    }

    #[test]
    fn test_failed_transfer_rolls_back() {
        let mut ledger = deploy();
        ledger
            .split(&Call::new(owner()).with_value(99), &first(), &second())
            .unwrap();

        let err = ledger
            .withdraw(&Call::new(first()), &mut pay_fail)
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::TransferFailed);
        assert_eq!(ledger.balance_of(&first()).unwrap(), 49);
        assert_eq!(ledger.held_value().unwrap(), 99);
        assert_eq!(ledger.store().open_savepoints().unwrap(), 0);
    }

    #[test]
    fn test_failed_transfer_keeps_nested_credit() {
        let mut ledger = deploy();
        ledger
            .split(&Call::new(owner()).with_value(99), &first(), &second())
            .unwrap();

        let mut fund_then_fail = |ledger: &mut Splitter<MemoryStore>,
                                  to: &Identity,
                                  amount: Amount|
         -> std::result::Result<(), TransferError> {
            ledger
                .split(&Call::new(owner()).with_value(10), &first(), &second())
                .unwrap();
            Err(TransferError::new(*to, amount, "recipient rejected payment"))
        };
        let err = ledger
            .withdraw(&Call::new(first()), &mut fund_then_fail)
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::TransferFailed);
        assert_eq!(ledger.balance_of(&first()).unwrap(), 49 + 5);
        assert_eq!(ledger.balance_of(&second()).unwrap(), 50 + 5);
        assert_eq!(ledger.held_value().unwrap(), 109);
        assert!(ledger.is_conserved().unwrap());
        assert_eq!(ledger.store().open_savepoints().unwrap(), 0);
    }

    #[test]
    fn test_withdraw_allowed_while_paused() {
        let mut ledger = deploy();
        ledger
            .split(&Call::new(owner()).with_value(10), &first(), &second())
            .unwrap();
        ledger.set_paused(&owner(), true).unwrap();

        ledger.withdraw(&Call::new(first()), &mut pay_ok).unwrap();
        assert_eq!(ledger.balance_of(&first()).unwrap(), 0);
    }

    #[test]
    fn test_balance_is_zero_during_payout() {
        let mut ledger = deploy();
        ledger
            .split(&Call::new(owner()).with_value(10), &first(), &second())
            .unwrap();

        let mut seen = None;
        let mut observe = |ledger: &mut Splitter<MemoryStore>,
                           to: &Identity,
                           _: Amount|
         -> std::result::Result<(), TransferError> {
            seen = Some((ledger.balance_of(to).unwrap(), ledger.held_value().unwrap()));
            Ok(())
        };
        ledger.withdraw(&Call::new(first()), &mut observe).unwrap();

        assert_eq!(seen, Some((0, 5)));
    }

    #[test]
    fn test_admin_changes_persist_to_store() {
        let new_owner = Identity::derive("new-owner");
        let mut ledger = deploy();

        ledger.set_paused(&owner(), true).unwrap();
        ledger.set_owner(&owner(), new_owner).unwrap();

        let reopened = Splitter::open(ledger.into_store()).unwrap();
        assert_eq!(reopened.owner(), new_owner);
        assert!(reopened.is_paused());
    }

    #[test]
    fn test_admin_changes_are_logged() {
        let new_owner = Identity::derive("new-owner");
        let mut ledger = deploy();

        let logs = capture_logs(|| {
            ledger.set_owner(&owner(), new_owner).unwrap();
            ledger.set_paused(&new_owner, true).unwrap();
        });

        assert!(logs.contains("owner set"));
        assert!(logs.contains("paused state set"));
    }

    #[test]
    fn test_unpersisted_admin_change_is_not_logged() {
        let new_owner = Identity::derive("new-owner");
        let mut ledger = Splitter::open(FrozenControl(deploy().into_store())).unwrap();

        let logs = capture_logs(|| {
            let err = ledger.set_owner(&owner(), new_owner).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Store);
            let err = ledger.set_paused(&owner(), true).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Store);
        });

        assert_eq!(ledger.owner(), owner());
        assert!(!ledger.is_paused());
        assert!(!logs.contains("owner set"));
        assert!(!logs.contains("paused state set"));
    }

    #[test]
    fn test_non_owner_admin_rejected() {
        let intruder = Identity::derive("unauthorised");
        let mut ledger = deploy();

        let err = ledger.set_owner(&intruder, intruder).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        let err = ledger.set_paused(&intruder, true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        assert_eq!(ledger.owner(), owner());
        assert!(!ledger.is_paused());
        assert_eq!(ledger.store().control().unwrap().unwrap().owner, owner());
    }
}
