//! # Emitter Identity
//!
//! Every participant on the bus (gates, controllers, nodes, live modules,
//! condition tests) publishes under its own `EmitterId`.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identity of a bus participant.
///
/// The nil identity is reserved and treated as malformed by the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EmitterId(Uuid);

impl EmitterId {
    /// Allocate a fresh, unique emitter identity.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The reserved nil identity.
    #[must_use]
    pub const fn nil() -> Self {
        Self(Uuid::nil())
    }

    /// Whether this is the reserved nil identity.
    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for EmitterId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EmitterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form keeps log lines readable.
        let simple = self.0.simple().to_string();
        write!(f, "{}", &simple[..8])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ids_are_unique() {
        assert_ne!(EmitterId::new(), EmitterId::new());
    }

    #[test]
    fn test_nil_is_reserved() {
        assert!(EmitterId::nil().is_nil());
        assert!(!EmitterId::new().is_nil());
    }

    #[test]
    fn test_display_is_short() {
        assert_eq!(EmitterId::new().to_string().len(), 8);
    }
}
