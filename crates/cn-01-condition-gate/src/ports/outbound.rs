//! Outbound (Driven) ports for the condition gate.
//!
//! Individual tests live outside the core. The gate only needs to ask a
//! test whether its expectation currently holds and to hear when the
//! environment the test observes has changed.

use async_trait::async_trait;
use shared_types::EmitterId;

/// A named suitability test.
#[async_trait]
pub trait ConditionTest: Send + Sync {
    /// Whether the environment currently satisfies `expected`.
    ///
    /// May suspend, e.g. while waiting on an external event.
    async fn assert(&self, expected: &str) -> bool;

    /// Emitter that publishes `change` on the bus whenever the observed
    /// environment changes. Tests without one are evaluated once.
    fn change_source(&self) -> Option<EmitterId> {
        None
    }
}
