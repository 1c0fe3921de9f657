//! # Subscription Set
//!
//! Records every registration a component makes so teardown can remove them
//! all synchronously, leaving nothing dangling on the bus.

use crate::bus::{BusEvent, EventBus, SubscriptionId};
use shared_types::EmitterId;

#[derive(Debug, Default)]
pub struct SubscriptionSet {
    entries: Vec<(EmitterId, String, SubscriptionId)>,
}

impl SubscriptionSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe through `bus` and remember the registration.
    pub fn subscribe<F>(
        &mut self,
        bus: &EventBus,
        emitter: EmitterId,
        topic: &str,
        callback: F,
    ) -> Option<SubscriptionId>
    where
        F: Fn(&BusEvent) + Send + Sync + 'static,
    {
        let id = bus.subscribe(emitter, topic, callback)?;
        self.entries.push((emitter, topic.to_owned(), id));
        Some(id)
    }

    /// Unsubscribe every remembered registration for (emitter, topic).
    pub fn unsubscribe_topic(&mut self, bus: &EventBus, emitter: EmitterId, topic: &str) -> usize {
        let mut removed = 0;
        self.entries.retain(|(e, t, id)| {
            if *e == emitter && t == topic {
                bus.unsubscribe(*e, t, *id);
                removed += 1;
                false
            } else {
                true
            }
        });
        removed
    }

    /// Unsubscribe everything. Returns how many registrations were removed.
    pub fn clear(&mut self, bus: &EventBus) -> usize {
        let removed = self.entries.len();
        for (emitter, topic, id) in self.entries.drain(..) {
            bus.unsubscribe(emitter, &topic, id);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
