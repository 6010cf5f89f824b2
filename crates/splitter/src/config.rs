//! Deployment configuration.

use serde::{Deserialize, Serialize};

/// Configuration applied when a ledger is deployed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitterConfig {
    /// Whether the ledger starts paused.
    pub start_paused: bool,
}

impl SplitterConfig {
    /// A configuration that deploys the ledger paused.
    pub fn paused() -> Self {
        Self { start_paused: true }
    }
}
