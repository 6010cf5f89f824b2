//! Call context supplied by the surrounding execution environment.

use crate::types::{Amount, Identity};

/// Who is invoking an operation, and how much value they attached.
///
/// The environment authenticates the caller before building a `Call`; the
/// ledger trusts `caller` as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Call {
    pub caller: Identity,
    pub value: Amount,
}

impl Call {
    /// A call from `caller` with no value attached.
    pub const fn new(caller: Identity) -> Self {
        Self { caller, value: 0 }
    }

    /// Attach `value` to the call.
    pub const fn with_value(self, value: Amount) -> Self {
        Self {
            caller: self.caller,
            value,
        }
    }

    /// Whether any value is attached.
    pub const fn has_value(&self) -> bool {
        self.value != 0
    }
}

impl From<Identity> for Call {
    fn from(caller: Identity) -> Self {
        Self::new(caller)
    }
}
