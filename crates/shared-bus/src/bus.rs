//! # Event Bus
//!
//! Registration table keyed by (emitter, topic) plus a propagation relation
//! that forwards every event of one emitter to the subscribers of another.

use crate::error::BusError;
use parking_lot::Mutex;
use serde_json::Value;
use shared_types::EmitterId;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Subscriber callback.
pub type Callback = Arc<dyn Fn(&BusEvent) + Send + Sync>;

/// Handle identifying one registration, used to unsubscribe it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// An event as seen by a subscriber.
#[derive(Debug, Clone, PartialEq)]
pub struct BusEvent {
    /// Emitter the subscriber registered on. For propagated events this is
    /// the propagation target, not the original publisher.
    pub emitter: EmitterId,
    /// Emitter that originally published the event.
    pub origin: EmitterId,
    /// Topic name.
    pub topic: String,
    /// Arbitrary payload.
    pub payload: Value,
}

struct Registration {
    id: SubscriptionId,
    callback: Callback,
}

#[derive(Default)]
struct Registrations {
    /// emitter → topic → callbacks in subscription order.
    subscribers: HashMap<EmitterId, HashMap<String, Vec<Registration>>>,
    /// source → targets in registration order.
    propagation: HashMap<EmitterId, Vec<EmitterId>>,
}

impl Registrations {
    fn snapshot(&self, emitter: EmitterId, topic: &str) -> Vec<Callback> {
        self.subscribers
            .get(&emitter)
            .and_then(|topics| topics.get(topic))
            .map(|regs| regs.iter().map(|r| Arc::clone(&r.callback)).collect())
            .unwrap_or_default()
    }

    fn targets(&self, emitter: EmitterId) -> Vec<EmitterId> {
        self.propagation.get(&emitter).cloned().unwrap_or_default()
    }
}

#[derive(Default)]
struct DispatchQueue {
    pending: VecDeque<BusEvent>,
    dispatching: bool,
}

/// Resets the dispatch flag if a callback panics mid-dispatch, so the bus
/// stays usable for the rest of the process.
struct PanicGuard<'a> {
    queue: &'a Mutex<DispatchQueue>,
}

impl Drop for PanicGuard<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            let mut queue = self.queue.lock();
            queue.pending.clear();
            queue.dispatching = false;
        }
    }
}

/// In-process publish/subscribe bus.
pub struct EventBus {
    registrations: Mutex<Registrations>,
    queue: Mutex<DispatchQueue>,
    next_subscription: AtomicU64,
    events_published: AtomicU64,
}

impl EventBus {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registrations: Mutex::new(Registrations::default()),
            queue: Mutex::new(DispatchQueue::default()),
            next_subscription: AtomicU64::new(1),
            events_published: AtomicU64::new(0),
        }
    }

    fn validate(emitter: EmitterId, topic: &str) -> Result<(), BusError> {
        if emitter.is_nil() {
            return Err(BusError::MalformedEmitter(emitter));
        }
        if topic.trim().is_empty() {
            return Err(BusError::EmptyTopic(emitter));
        }
        Ok(())
    }

    // =========================================================================
    // SUBSCRIPTIONS
    // =========================================================================

    /// Register `callback` for `topic` on `emitter`.
    ///
    /// Malformed registrations (nil emitter, empty topic) are logged and
    /// ignored, in which case `None` is returned.
    pub fn subscribe<F>(&self, emitter: EmitterId, topic: &str, callback: F) -> Option<SubscriptionId>
    where
        F: Fn(&BusEvent) + Send + Sync + 'static,
    {
        self.subscribe_callback(emitter, topic, Arc::new(callback))
    }

    /// Register an already shared callback.
    pub fn subscribe_callback(
        &self,
        emitter: EmitterId,
        topic: &str,
        callback: Callback,
    ) -> Option<SubscriptionId> {
        if let Err(err) = Self::validate(emitter, topic) {
            warn!(error = %err, "Subscription ignored");
            return None;
        }

        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.registrations
            .lock()
            .subscribers
            .entry(emitter)
            .or_default()
            .entry(topic.to_owned())
            .or_default()
            .push(Registration { id, callback });

        trace!(emitter = %emitter, topic, "Subscribed");
        Some(id)
    }

    /// Remove exactly one registration. Returns whether it existed.
    pub fn unsubscribe(&self, emitter: EmitterId, topic: &str, id: SubscriptionId) -> bool {
        let mut registrations = self.registrations.lock();
        let Some(topics) = registrations.subscribers.get_mut(&emitter) else {
            return false;
        };
        let Some(regs) = topics.get_mut(topic) else {
            return false;
        };
        let Some(position) = regs.iter().position(|r| r.id == id) else {
            return false;
        };

        regs.remove(position);
        if regs.is_empty() {
            topics.remove(topic);
        }
        if topics.is_empty() {
            registrations.subscribers.remove(&emitter);
        }
        trace!(emitter = %emitter, topic, "Unsubscribed");
        true
    }

    // =========================================================================
    // PROPAGATION
    // =========================================================================

    /// Forward every event of `source` to the subscribers of `target`.
    ///
    /// Returns `false` if the relation already existed or is malformed.
    pub fn propagate(&self, source: EmitterId, target: EmitterId) -> bool {
        let check = if source.is_nil() {
            Err(BusError::MalformedEmitter(source))
        } else if target.is_nil() {
            Err(BusError::MalformedEmitter(target))
        } else if source == target {
            Err(BusError::SelfPropagation(source))
        } else {
            Ok(())
        };
        if let Err(err) = check {
            warn!(error = %err, "Propagation ignored");
            return false;
        }

        let mut registrations = self.registrations.lock();
        let targets = registrations.propagation.entry(source).or_default();
        if targets.contains(&target) {
            return false;
        }
        targets.push(target);
        trace!(source = %source, target = %target, "Propagating");
        true
    }

    /// Remove the forwarding relation. Returns whether it existed.
    pub fn stop_propagating(&self, source: EmitterId, target: EmitterId) -> bool {
        let mut registrations = self.registrations.lock();
        let Some(targets) = registrations.propagation.get_mut(&source) else {
            return false;
        };
        let before = targets.len();
        targets.retain(|t| *t != target);
        let removed = targets.len() != before;
        if targets.is_empty() {
            registrations.propagation.remove(&source);
        }
        if removed {
            trace!(source = %source, target = %target, "Stopped propagating");
        }
        removed
    }

    /// Drop every subscription on `emitter` and every propagation entry it
    /// takes part in, as source or as target.
    pub fn remove_emitter(&self, emitter: EmitterId) {
        let mut registrations = self.registrations.lock();
        registrations.subscribers.remove(&emitter);
        registrations.propagation.remove(&emitter);
        registrations.propagation.retain(|_, targets| {
            targets.retain(|t| *t != emitter);
            !targets.is_empty()
        });
        trace!(emitter = %emitter, "Emitter removed");
    }

    // =========================================================================
    // PUBLISHING
    // =========================================================================

    /// Publish `topic` from `emitter`.
    ///
    /// Subscribers run synchronously in subscription order, over a snapshot
    /// taken when the event is dispatched; the event is then forwarded to
    /// every propagation target. If another event is being dispatched on
    /// this bus, the new one is queued behind it.
    pub fn publish(&self, emitter: EmitterId, topic: &str, payload: Value) {
        if let Err(err) = Self::validate(emitter, topic) {
            warn!(error = %err, "Publish ignored");
            return;
        }
        self.events_published.fetch_add(1, Ordering::Relaxed);

        let event = BusEvent {
            emitter,
            origin: emitter,
            topic: topic.to_owned(),
            payload,
        };

        {
            let mut queue = self.queue.lock();
            queue.pending.push_back(event);
            if queue.dispatching {
                trace!(emitter = %emitter, topic, "Queued behind in-progress dispatch");
                return;
            }
            queue.dispatching = true;
        }

        let _guard = PanicGuard { queue: &self.queue };
        loop {
            let next = {
                let mut queue = self.queue.lock();
                match queue.pending.pop_front() {
                    Some(event) => event,
                    None => {
                        queue.dispatching = false;
                        return;
                    }
                }
            };
            let mut visited = HashSet::new();
            self.deliver(&next, &mut visited);
        }
    }

    fn deliver(&self, event: &BusEvent, visited: &mut HashSet<EmitterId>) {
        if !visited.insert(event.emitter) {
            return;
        }

        let (callbacks, targets) = {
            let registrations = self.registrations.lock();
            (
                registrations.snapshot(event.emitter, &event.topic),
                registrations.targets(event.emitter),
            )
        };

        debug!(
            emitter = %event.emitter,
            origin = %event.origin,
            topic = %event.topic,
            subscribers = callbacks.len(),
            "Dispatching event"
        );

        for callback in &callbacks {
            callback(event);
        }

        for target in targets {
            let forwarded = BusEvent {
                emitter: target,
                ..event.clone()
            };
            self.deliver(&forwarded, visited);
        }
    }

    // =========================================================================
    // INTROSPECTION
    // =========================================================================

    /// Number of callbacks registered for (emitter, topic).
    #[must_use]
    pub fn subscriber_count(&self, emitter: EmitterId, topic: &str) -> usize {
        self.registrations
            .lock()
            .subscribers
            .get(&emitter)
            .and_then(|topics| topics.get(topic))
            .map_or(0, Vec::len)
    }

    /// Number of callbacks registered on `emitter`, across all topics.
    #[must_use]
    pub fn emitter_subscriptions(&self, emitter: EmitterId) -> usize {
        self.registrations
            .lock()
            .subscribers
            .get(&emitter)
            .map_or(0, |topics| topics.values().map(Vec::len).sum())
    }

    /// Whether `source` currently forwards to `target`.
    #[must_use]
    pub fn is_propagating(&self, source: EmitterId, target: EmitterId) -> bool {
        self.registrations
            .lock()
            .propagation
            .get(&source)
            .is_some_and(|targets| targets.contains(&target))
    }

    /// Whether `emitter` appears anywhere in the propagation relation.
    #[must_use]
    pub fn has_propagation(&self, emitter: EmitterId) -> bool {
        let registrations = self.registrations.lock();
        registrations.propagation.contains_key(&emitter)
            || registrations
                .propagation
                .values()
                .any(|targets| targets.contains(&emitter))
    }

    /// Total number of events accepted for publishing.
    #[must_use]
    pub fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registrations = self.registrations.lock();
        f.debug_struct("EventBus")
            .field("emitters", &registrations.subscribers.len())
            .field("propagation_sources", &registrations.propagation.len())
            .field("events_published", &self.events_published())
            .finish()
    }
}
