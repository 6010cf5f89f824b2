//! # Splitter Testkit
//!
//! Testing utilities for the Splitter ledger.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: a deployed ledger with named parties and a simulated bank
//! - **Transfer doubles**: primitives that fail or re-enter the ledger
//! - **Generators**: Proptest strategies for identities, amounts and
//!   randomized operation sessions
//!
//! ## Test Fixtures
//!
//! ```rust
//! use splitter_testkit::TestFixture;
//!
//! let mut fixture = TestFixture::new();
//! let (owner, first, second) = (fixture.owner, fixture.first, fixture.second);
//!
//! fixture.split(owner, first, second, 99).unwrap();
//! fixture.withdraw(first).unwrap();
//! assert_eq!(fixture.ledger.held_value().unwrap(), 50);
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use splitter_testkit::generators::ops;
//!
//! proptest! {
//!     #[test]
//!     fn ledger_conserves_value(session in ops(32)) {
//!         // apply each op to a TestFixture and check held == sum(balances)
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{
    init_tracing, parties, Bank, FailingTransfer, LedgerSnapshot, ReentrantTransfer, TestFixture,
    STARTING_FUNDS,
};
pub use generators::{op, ops, Op};
