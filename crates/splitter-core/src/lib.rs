//! # Splitter Core
//!
//! Pure primitives for the Splitter ledger: identities, amounts, call
//! context and events.
//!
//! This crate contains no I/O and no storage. It is the vocabulary shared by
//! the permission, storage and ledger crates.
//!
//! ## Key Types
//!
//! - [`Identity`] - Opaque 32-byte account identity (all-zero is null)
//! - [`Amount`] - Native value in the smallest denomination
//! - [`Call`] - Caller identity plus attached value
//! - [`Event`] - Notification emitted by a successful operation

pub mod call;
pub mod error;
pub mod event;
pub mod types;

pub use call::Call;
pub use error::{CoreError, TransferError};
pub use event::Event;
pub use types::{amount_from_bytes, amount_to_bytes, Amount, Identity};
