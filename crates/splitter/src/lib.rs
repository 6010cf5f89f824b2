//! # Splitter
//!
//! A two-way payment splitting ledger with owner authorization, pause
//! control and reentrancy-safe withdrawals.
//!
//! ## Overview
//!
//! - **Split**: incoming value is credited to two distinct recipients; the
//!   first gets half (rounded down), the second gets the rest
//! - **Withdraw**: a recipient claims their full credited balance; the
//!   balance is zeroed before the payout runs
//! - **Owner**: a single identity may transfer ownership and pause `split`
//! - **Pause**: blocks `split` only; withdrawals keep working
//!
//! ## Key Concepts
//!
//! - **Call**: the caller identity and attached value, supplied explicitly by
//!   the environment
//! - **Events**: every successful mutation returns the events it produced
//! - **Atomicity**: a failed operation leaves no state change and no events
//! - **Conservation**: the held value always equals the sum of balances
//!
//! ## Usage
//!
//! ```rust
//! use splitter::{Call, Identity, Splitter, SplitterConfig, TransferError};
//! use splitter::store::MemoryStore;
//!
//! let owner = Identity::derive("owner");
//! let first = Identity::derive("first");
//! let second = Identity::derive("second");
//!
//! let mut ledger = Splitter::deploy(MemoryStore::new(), owner, SplitterConfig::default()).unwrap();
//! ledger.split(&Call::new(owner).with_value(99), &first, &second).unwrap();
//! assert_eq!(ledger.balance_of(&first).unwrap(), 49);
//! assert_eq!(ledger.balance_of(&second).unwrap(), 50);
//!
//! let mut payout = |_: &mut Splitter<MemoryStore>, _: &Identity, _: u128| -> Result<(), TransferError> {
//!     Ok(())
//! };
//! ledger.withdraw(&Call::new(first), &mut payout).unwrap();
//! assert_eq!(ledger.held_value().unwrap(), 50);
//! ```
//!
//! ## Re-exports
//!
//! - `splitter::core` - Identities, calls and events
//! - `splitter::store` - Storage abstraction and SQLite
//! - `splitter::perms` - Ownership guard and pause controller

pub mod config;
pub mod error;
pub mod ledger;
pub mod transfer;

// Re-export component crates
pub use splitter_core as core;
pub use splitter_perms as perms;
pub use splitter_store as store;

// Re-export main types for convenience
pub use config::SplitterConfig;
pub use error::{ErrorKind, Result, SplitterError};
pub use ledger::{Splitter, MIN_SPLIT_VALUE};
pub use transfer::ValueTransfer;

// Re-export commonly used core types
pub use splitter_core::{Amount, Call, Event, Identity, TransferError};
