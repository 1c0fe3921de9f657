//! Errors for malformed bus registrations.
//!
//! These are logged rather than returned: subscribing with a malformed
//! emitter or topic fails silently by policy.

use shared_types::EmitterId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    /// The reserved nil emitter cannot be subscribed to or published from.
    #[error("malformed emitter {0}")]
    MalformedEmitter(EmitterId),

    /// Topics must be non-empty.
    #[error("empty topic for emitter {0}")]
    EmptyTopic(EmitterId),

    /// An emitter cannot propagate to itself.
    #[error("emitter {0} cannot propagate to itself")]
    SelfPropagation(EmitterId),
}
