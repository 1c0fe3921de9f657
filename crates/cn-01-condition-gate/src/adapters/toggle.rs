//! # Toggle Test
//!
//! A condition test backed by a value the host application sets directly,
//! e.g. a feature switch or a value pushed from an external monitor. The
//! test passes when the current value equals the expected one.

use crate::ports::ConditionTest;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use shared_bus::{topics, EventBus};
use shared_types::EmitterId;
use std::sync::Arc;
use tracing::debug;

pub struct ToggleTest {
    bus: Arc<EventBus>,
    emitter: EmitterId,
    value: Mutex<String>,
}

impl ToggleTest {
    pub fn new(bus: Arc<EventBus>, initial: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            bus,
            emitter: EmitterId::new(),
            value: Mutex::new(initial.into()),
        })
    }

    pub fn value(&self) -> String {
        self.value.lock().clone()
    }

    pub fn emitter(&self) -> EmitterId {
        self.emitter
    }

    /// Set the observed value. Publishes `change` when it actually changed.
    pub fn set(&self, value: impl Into<String>) -> bool {
        let value = value.into();
        {
            let mut current = self.value.lock();
            if *current == value {
                return false;
            }
            current.clone_from(&value);
        }
        debug!(emitter = %self.emitter, value = %value, "Toggle changed");
        self.bus.publish(self.emitter, topics::CHANGE, json!({ "value": value }));
        true
    }
}

#[async_trait]
impl ConditionTest for ToggleTest {
    async fn assert(&self, expected: &str) -> bool {
        *self.value.lock() == expected
    }

    fn change_source(&self) -> Option<EmitterId> {
        Some(self.emitter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_assert_tracks_value() {
        let bus = Arc::new(EventBus::new());
        let toggle = ToggleTest::new(bus, "wide");

        assert!(toggle.assert("wide").await);
        assert!(!toggle.assert("narrow").await);

        toggle.set("narrow");
        assert!(toggle.assert("narrow").await);
    }

    #[test]
    fn test_change_published_only_on_change() {
        let bus = Arc::new(EventBus::new());
        let toggle = ToggleTest::new(Arc::clone(&bus), "on");

        let changes = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&changes);
        bus.subscribe(toggle.emitter(), topics::CHANGE, move |_| *counter.lock() += 1);

        assert!(!toggle.set("on"));
        assert!(toggle.set("off"));
        assert!(toggle.set("on"));
        assert_eq!(*changes.lock(), 2);
    }
}
