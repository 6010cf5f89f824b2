//! # Splitter Permissions
//!
//! Single-owner authorization and the pause switch.
//!
//! ## Overview
//!
//! Two small components, composed by delegation:
//!
//! - **Owned**: holds the owner identity, checks callers against it and
//!   transfers ownership
//! - **Pausable**: holds the paused flag and wraps an `Owned`; only the owner
//!   may toggle it
//!
//! Successful mutations return the [`Event`](splitter_core::Event) they
//! produced. Failed checks return a [`PermsError`] and change nothing.
//!
//! ## Usage
//!
//! ```rust
//! use splitter_core::Identity;
//! use splitter_perms::Pausable;
//!
//! let owner = Identity::derive("owner");
//! let mut pausable = Pausable::new(owner, false);
//!
//! pausable.set_paused(&owner, true).unwrap();
//! assert!(pausable.is_paused());
//! ```

pub mod error;
pub mod owned;
pub mod pausable;

pub use error::{PermsError, Result};
pub use owned::Owned;
pub use pausable::Pausable;
