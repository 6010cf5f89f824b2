//! Notifications emitted by successful ledger operations.
//!
//! Every mutating operation returns the events it produced instead of pushing
//! them to a global log. The environment decides how to broadcast them. A
//! failed operation never produces events.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{Amount, Identity};

/// A structured notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// Ownership moved from `previous_owner` to `new_owner`.
    OwnerSet {
        previous_owner: Identity,
        new_owner: Identity,
    },

    /// The owner set the paused flag.
    PausedSet {
        sender: Identity,
        new_paused_state: bool,
    },

    /// `amount` was received from `sender` and credited to two recipients.
    Split {
        sender: Identity,
        first: Identity,
        second: Identity,
        amount: Amount,
    },

    /// `sender` withdrew their full credited `balance`.
    Withdrawn { sender: Identity, balance: Amount },
}

impl Event {
    /// Short name of the event, stable across versions.
    pub fn name(&self) -> &'static str {
        match self {
            Event::OwnerSet { .. } => "LogOwnerSet",
            Event::PausedSet { .. } => "LogPausedSet",
            Event::Split { .. } => "LogSplit",
            Event::Withdrawn { .. } => "LogWithdrawn",
        }
    }

    /// Serialize to CBOR bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CoreError> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf)
            .map_err(|e| CoreError::EncodingError(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize from CBOR bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CoreError> {
        ciborium::from_reader(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))
    }
}
