//! Proptest generators for property-based testing.

use proptest::prelude::*;

use splitter_core::{Amount, Identity};

use crate::fixtures::parties;

/// Generate a random identity (possibly, though rarely, the null one).
pub fn identity() -> impl Strategy<Value = Identity> {
    any::<[u8; 32]>().prop_map(Identity::from_bytes)
}

/// Generate a random non-null identity.
pub fn non_null_identity() -> impl Strategy<Value = Identity> {
    identity().prop_filter("identity must not be null", |id| !id.is_null())
}

/// Generate one of the five fixture parties, or the null identity.
pub fn party_or_null() -> impl Strategy<Value = Identity> {
    prop_oneof![
        9 => (0usize..5).prop_map(|i| parties()[i]),
        1 => Just(Identity::ZERO),
    ]
}

/// Generate an amount that fixture parties can afford many times over.
pub fn amount() -> impl Strategy<Value = Amount> {
    prop_oneof![
        2 => 0u128..=3,
        8 => 0u128..=10_000,
    ]
}

/// One step of a randomized ledger session.
#[derive(Debug, Clone)]
pub enum Op {
    Split {
        sender: Identity,
        first: Identity,
        second: Identity,
        value: Amount,
    },
    Withdraw {
        caller: Identity,
        value: Amount,
    },
    Receive {
        sender: Identity,
        value: Amount,
    },
    SetPaused {
        caller: Identity,
        paused: bool,
    },
    SetOwner {
        caller: Identity,
        new_owner: Identity,
    },
}

/// Generate a single operation over the fixture parties.
pub fn op() -> impl Strategy<Value = Op> {
    let party = || (0usize..5).prop_map(|i| parties()[i]);
    let small_value = || prop_oneof![4 => Just(0u128), 1 => 1u128..=5];

    prop_oneof![
        5 => (party(), party_or_null(), party_or_null(), amount()).prop_map(
            |(sender, first, second, value)| Op::Split {
                sender,
                first,
                second,
                value,
            }
        ),
        4 => (party(), small_value())
            .prop_map(|(caller, value)| Op::Withdraw { caller, value }),
        1 => (party(), amount()).prop_map(|(sender, value)| Op::Receive { sender, value }),
        1 => (party(), any::<bool>()).prop_map(|(caller, paused)| Op::SetPaused { caller, paused }),
        1 => (party(), party()).prop_map(|(caller, new_owner)| Op::SetOwner { caller, new_owner }),
    ]
}

/// Generate a session of up to `max_len` operations.
pub fn ops(max_len: usize) -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(op(), 0..=max_len)
}
