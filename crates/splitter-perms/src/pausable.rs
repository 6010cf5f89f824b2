//! Owner-controlled pause switch.
//!
//! The pause flag gates fund-moving operations. It is toggled only by the
//! owner; authorization is delegated to the wrapped [`Owned`] guard.

use splitter_core::{Event, Identity};

use crate::error::{PermsError, Result};
use crate::owned::Owned;

/// Pause controller layered over the ownership guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pausable {
    owned: Owned,
    paused: bool,
}

impl Pausable {
    /// Create a controller owned by `deployer` with the given initial state.
    pub fn new(deployer: Identity, paused: bool) -> Self {
        Self {
            owned: Owned::new(deployer),
            paused,
        }
    }

    /// Rebuild from previously persisted parts.
    pub fn from_parts(owned: Owned, paused: bool) -> Self {
        Self { owned, paused }
    }

    /// Whether fund-moving operations are currently blocked.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Fail with [`PermsError::ContractPaused`] while paused.
    pub fn require_not_paused(&self) -> Result<()> {
        if self.paused {
            Err(PermsError::ContractPaused)
        } else {
            Ok(())
        }
    }

    /// Set the paused flag. Owner only.
    ///
    /// Setting the flag to its current value is allowed and still emits.
    pub fn set_paused(&mut self, caller: &Identity, new_state: bool) -> Result<Event> {
        self.owned.require_owner(caller)?;

        self.paused = new_state;

        Ok(Event::PausedSet {
            sender: *caller,
            new_paused_state: new_state,
        })
    }

    /// The current owner.
    pub fn owner(&self) -> Identity {
        self.owned.owner()
    }

    /// Transfer ownership; see [`Owned::set_owner`].
    pub fn set_owner(&mut self, caller: &Identity, new_owner: Identity) -> Result<Event> {
        self.owned.set_owner(caller, new_owner)
    }
}
