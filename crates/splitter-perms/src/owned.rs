//! Single-owner authorization guard.

use splitter_core::{Event, Identity};

use crate::error::{PermsError, Result};

/// Holds the one identity allowed to run privileged operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Owned {
    owner: Identity,
}

impl Owned {
    /// Create a guard owned by the deployer.
    pub fn new(deployer: Identity) -> Self {
        Self { owner: deployer }
    }

    /// The current owner.
    pub fn owner(&self) -> Identity {
        self.owner
    }

    /// Whether `caller` is the current owner.
    pub fn is_owner(&self, caller: &Identity) -> bool {
        self.owner == *caller
    }

    /// Fail with [`PermsError::Unauthorized`] unless `caller` is the owner.
    pub fn require_owner(&self, caller: &Identity) -> Result<()> {
        if self.is_owner(caller) {
            Ok(())
        } else {
            Err(PermsError::Unauthorized { caller: *caller })
        }
    }

    /// Transfer ownership to `new_owner`.
    ///
    /// Self-transfer and the null identity are accepted; callers that need
    /// stricter rules check before delegating here.
    pub fn set_owner(&mut self, caller: &Identity, new_owner: Identity) -> Result<Event> {
        self.require_owner(caller)?;

        let previous_owner = self.owner;
        self.owner = new_owner;

        Ok(Event::OwnerSet {
            previous_owner,
            new_owner,
        })
    }
}
