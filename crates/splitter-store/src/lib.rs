//! # Splitter Store
//!
//! Storage abstraction for the Splitter ledger. Provides a trait-based
//! interface for ledger persistence with SQLite and in-memory implementations.
//!
//! ## Overview
//!
//! The store module abstracts ledger state behind the [`LedgerStore`] trait,
//! allowing the ledger to be storage-agnostic. The durable implementation
//! is [`SqliteStore`], with [`MemoryStore`] for testing.
//!
//! ## Key Types
//!
//! - [`LedgerStore`] - The trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`ControlRecord`] - Persisted owner and pause flag
//! - [`Savepoint`] - Handle to a nested, revertible snapshot
//!
//! ## Usage
//!
//! ```rust,no_run
//! use splitter_core::Identity;
//! use splitter_store::{LedgerStore, SqliteStore};
//!
//! let store = SqliteStore::open("ledger.db").unwrap();
//! let first = Identity::derive("first");
//!
//! let sp = store.savepoint().unwrap();
//! store.set_balance(&first, 49).unwrap();
//! store.rollback_to(sp).unwrap();
//! assert_eq!(store.balance(&first).unwrap(), 0);
//! ```
//!
//! ## Design Notes
//!
//! - **Default zero**: unknown identities read a zero balance
//! - **Append-structured**: entries are zeroed, never removed
//! - **Nested savepoints**: every ledger mutation can be undone as a unit

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{ControlRecord, LedgerStore, LedgerStoreExt, Savepoint};
