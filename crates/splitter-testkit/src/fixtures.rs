//! Test fixtures and helpers.
//!
//! Common setup code for integration tests: named parties, a simulated
//! native-value bank, and transfer primitives that fail or re-enter.

use std::collections::BTreeMap;

use splitter::{ErrorKind, Result, Splitter, SplitterConfig, ValueTransfer};
use splitter_core::{Amount, Call, Event, Identity, TransferError};
use splitter_store::{LedgerStore, MemoryStore};

/// Native value every fixture party starts with.
pub const STARTING_FUNDS: Amount = 1_000_000;

/// Simulated native-value accounts outside the ledger.
///
/// Acts as the value-transfer primitive: a payout credits the recipient's
/// account.
#[derive(Debug, Clone, Default)]
pub struct Bank {
    accounts: BTreeMap<Identity, Amount>,
    payouts: Vec<(Identity, Amount)>,
}

impl Bank {
    /// Create an empty bank.
    pub fn new() -> Self {
        Self::default()
    }

    /// Give `who` some native value.
    pub fn fund(&mut self, who: Identity, amount: Amount) {
        *self.accounts.entry(who).or_default() += amount;
    }

    /// Native value held by `who`.
    pub fn balance(&self, who: &Identity) -> Amount {
        self.accounts.get(who).copied().unwrap_or(0)
    }

    /// Sum of all accounts.
    pub fn total(&self) -> Amount {
        self.accounts.values().sum()
    }

    /// Take `amount` from `who`. Returns false if they cannot afford it.
    pub fn debit(&mut self, who: &Identity, amount: Amount) -> bool {
        match self.accounts.get_mut(who) {
            Some(balance) if *balance >= amount => {
                *balance -= amount;
                true
            }
            _ => amount == 0,
        }
    }

    /// Every payout made so far, in order.
    pub fn payouts(&self) -> &[(Identity, Amount)] {
        &self.payouts
    }
}

impl<S: LedgerStore> ValueTransfer<S> for Bank {
    fn transfer(
        &mut self,
        _ledger: &mut Splitter<S>,
        to: &Identity,
        amount: Amount,
    ) -> std::result::Result<(), TransferError> {
        self.fund(*to, amount);
        self.payouts.push((*to, amount));
        Ok(())
    }
}

/// A transfer primitive that always reports failure.
#[derive(Debug, Clone)]
pub struct FailingTransfer {
    pub reason: String,
}

impl FailingTransfer {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl<S: LedgerStore> ValueTransfer<S> for FailingTransfer {
    fn transfer(
        &mut self,
        _ledger: &mut Splitter<S>,
        to: &Identity,
        amount: Amount,
    ) -> std::result::Result<(), TransferError> {
        Err(TransferError::new(*to, amount, self.reason.clone()))
    }
}

/// A transfer primitive that calls `withdraw` again before paying out.
///
/// Models a recipient whose payment hook re-enters the ledger.
#[derive(Debug, Clone)]
pub struct ReentrantTransfer {
    /// Where successful payouts land.
    pub bank: Bank,
    /// Outcome of every nested `withdraw`, innermost first.
    pub nested: Vec<std::result::Result<Vec<Event>, ErrorKind>>,
    reenter_as: Option<Identity>,
    fail_after_reentry: bool,
    max_depth: usize,
    depth: usize,
}

impl ReentrantTransfer {
    /// Re-enter `withdraw` as the recipient being paid.
    pub fn new() -> Self {
        Self {
            bank: Bank::new(),
            nested: Vec::new(),
            reenter_as: None,
            fail_after_reentry: false,
            max_depth: 1,
            depth: 0,
        }
    }

    /// Re-enter `withdraw` as a different identity.
    pub fn as_identity(mut self, who: Identity) -> Self {
        self.reenter_as = Some(who);
        self
    }

    /// Report failure for the outermost payout after re-entering.
    pub fn fail_after_reentry(mut self) -> Self {
        self.fail_after_reentry = true;
        self
    }

    /// How many nested calls to attempt.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}

impl Default for ReentrantTransfer {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: LedgerStore> ValueTransfer<S> for ReentrantTransfer {
    fn transfer(
        &mut self,
        ledger: &mut Splitter<S>,
        to: &Identity,
        amount: Amount,
    ) -> std::result::Result<(), TransferError> {
        let outermost = self.depth == 0;

        if self.depth < self.max_depth {
            self.depth += 1;
            let who = self.reenter_as.unwrap_or(*to);
            let result = ledger.withdraw(&Call::new(who), self).map_err(|e| e.kind());
            self.depth -= 1;
            self.nested.push(result);
        }

        if outermost && self.fail_after_reentry {
            return Err(TransferError::new(*to, amount, "reverted after reentry"));
        }

        self.bank.transfer(ledger, to, amount)
    }
}

/// Observable ledger state, for before/after comparisons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub owner: Identity,
    pub paused: bool,
    pub held: Amount,
    pub balances: Vec<(Identity, Amount)>,
}

/// A deployed ledger, a bank and the named parties from the classic
/// splitter scenarios.
pub struct TestFixture<S: LedgerStore = MemoryStore> {
    pub ledger: Splitter<S>,
    pub bank: Bank,
    pub owner: Identity,
    pub first: Identity,
    pub second: Identity,
    pub new_owner: Identity,
    pub unauthorised: Identity,
}

impl TestFixture<MemoryStore> {
    /// Deploy an active ledger into a fresh in-memory store.
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new(), SplitterConfig::default())
    }

    /// Deploy with an explicit configuration.
    pub fn with_config(config: SplitterConfig) -> Self {
        Self::with_store(MemoryStore::new(), config)
    }
}

impl Default for TestFixture<MemoryStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: LedgerStore> TestFixture<S> {
    /// Deploy into `store`, panicking if deployment fails.
    pub fn with_store(store: S, config: SplitterConfig) -> Self {
        let [owner, first, second, new_owner, unauthorised] = parties();
        let ledger = Splitter::deploy(store, owner, config).expect("deploy into fresh store");

        let mut bank = Bank::new();
        for party in parties() {
            bank.fund(party, STARTING_FUNDS);
        }

        Self {
            ledger,
            bank,
            owner,
            first,
            second,
            new_owner,
            unauthorised,
        }
    }

    /// Send `value` from `sender` into `split`.
    ///
    /// The sender's bank account is debited only if the split succeeds.
    pub fn split(
        &mut self,
        sender: Identity,
        first: Identity,
        second: Identity,
        value: Amount,
    ) -> Result<Vec<Event>> {
        assert!(
            self.bank.balance(&sender) >= value,
            "fixture party cannot afford {}",
            value
        );
        let events = self
            .ledger
            .split(&Call::new(sender).with_value(value), &first, &second)?;
        self.bank.debit(&sender, value);
        Ok(events)
    }

    /// Withdraw `who`'s balance into the bank.
    pub fn withdraw(&mut self, who: Identity) -> Result<Vec<Event>> {
        self.ledger.withdraw(&Call::new(who), &mut self.bank)
    }

    /// Withdraw while attaching `value` to the call.
    pub fn withdraw_with_value(&mut self, who: Identity, value: Amount) -> Result<Vec<Event>> {
        self.ledger
            .withdraw(&Call::new(who).with_value(value), &mut self.bank)
    }

    /// Ledger balance of `who`.
    pub fn balance(&self, who: &Identity) -> Amount {
        self.ledger.balance_of(who).expect("read balance")
    }

    /// Capture everything observable about the ledger.
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            owner: self.ledger.owner(),
            paused: self.ledger.is_paused(),
            held: self.ledger.held_value().expect("read held value"),
            balances: self.ledger.store().balances().expect("read balances"),
        }
    }

    /// Native value across the bank and the ledger combined.
    pub fn total_value(&self) -> Amount {
        self.bank.total() + self.ledger.held_value().expect("read held value")
    }
}

/// The five parties used throughout the scenarios, in order:
/// owner, first, second, new owner, unauthorised.
pub fn parties() -> [Identity; 5] {
    [
        Identity::derive("owner"),
        Identity::derive("first"),
        Identity::derive("second"),
        Identity::derive("new-owner"),
        Identity::derive("unauthorised"),
    ]
}

/// Install a test-friendly tracing subscriber. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
        .with_test_writer()
        .try_init();
}
