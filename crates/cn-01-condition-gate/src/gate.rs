//! # Condition Gate
//!
//! Aggregates one candidate's condition set into a single suitability flag.
//!
//! ## Evaluation
//!
//! ```text
//! construct ──spawn──→ [evaluating] ──apply──→ ready (publish "ready")
//!                             ↑                    │
//!                             └── test "change" ───┘ apply: publish "change" on flip only
//! ```
//!
//! Every evaluation carries a generation number. A result whose generation
//! has been superseded is discarded, so a slow evaluation can never
//! overwrite a newer one.

use crate::domain::{Condition, ConditionSet};
use crate::ports::ConditionTest;
use crate::registry::TestRegistry;
use parking_lot::Mutex;
use serde_json::json;
use shared_bus::{topics, EventBus, SubscriptionSet};
use shared_types::EmitterId;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// A condition term bound to the test that evaluates it.
#[derive(Clone)]
struct Binding {
    condition: Condition,
    /// `None` when the key is unknown; such a term never passes.
    test: Option<Arc<dyn ConditionTest>>,
}

struct GateState {
    suitable: bool,
    ready: bool,
    generation: u64,
    alive: bool,
    evaluation: Option<JoinHandle<()>>,
    subscriptions: SubscriptionSet,
}

pub struct ConditionGate {
    emitter: EmitterId,
    bus: Arc<EventBus>,
    expression: String,
    bindings: Vec<Binding>,
    runtime: Handle,
    state: Mutex<GateState>,
}

impl ConditionGate {
    /// Build a gate for `expression` and start its first evaluation.
    ///
    /// Empty expressions are suitable and ready immediately; so are
    /// unparsable ones, except they are permanently unsuitable.
    pub fn new(
        expression: &str,
        bus: Arc<EventBus>,
        tests: &TestRegistry,
        runtime: Handle,
    ) -> Arc<Self> {
        let expression = expression.trim().to_owned();

        let (bindings, evaluable) = match ConditionSet::parse(&expression) {
            Ok(set) => (Self::bind(&set, tests), !set.is_empty()),
            Err(err) => {
                warn!(error = %err, "[Gate] Condition set treated as unsuitable");
                (Vec::new(), false)
            }
        };

        // Empty sets are trivially suitable; broken ones are settled as unsuitable.
        let settled_suitable = expression.is_empty();
        let gate = Arc::new(Self {
            emitter: EmitterId::new(),
            bus,
            expression,
            bindings,
            runtime,
            state: Mutex::new(GateState {
                suitable: settled_suitable,
                ready: !evaluable,
                generation: 0,
                alive: true,
                evaluation: None,
                subscriptions: SubscriptionSet::new(),
            }),
        });

        if evaluable {
            gate.watch_tests();
            gate.refresh();
        }
        gate
    }

    fn bind(set: &ConditionSet, tests: &TestRegistry) -> Vec<Binding> {
        set.iter()
            .map(|condition| {
                let test = tests.get_test_by_key(&condition.key);
                if test.is_none() {
                    warn!(key = %condition.key, "[Gate] Unknown condition test, treated as unsuitable");
                }
                Binding {
                    condition: condition.clone(),
                    test,
                }
            })
            .collect()
    }

    fn watch_tests(self: &Arc<Self>) {
        let sources: HashSet<EmitterId> = self
            .bindings
            .iter()
            .filter_map(|b| b.test.as_ref().and_then(|t| t.change_source()))
            .collect();

        let mut state = self.state.lock();
        for source in sources {
            let weak = Arc::downgrade(self);
            state.subscriptions.subscribe(&self.bus, source, topics::CHANGE, move |_| {
                if let Some(gate) = weak.upgrade() {
                    gate.refresh();
                }
            });
        }
    }

    /// Re-evaluate the whole condition set asynchronously.
    ///
    /// Any evaluation still in flight is superseded.
    pub fn refresh(self: &Arc<Self>) {
        let generation = {
            let mut state = self.state.lock();
            if !state.alive {
                return;
            }
            state.generation += 1;
            if let Some(previous) = state.evaluation.take() {
                previous.abort();
            }
            state.generation
        };

        let bindings = self.bindings.clone();
        let weak = Arc::downgrade(self);
        let handle = self.runtime.spawn(async move {
            let suitable = Self::evaluate(&bindings).await;
            if let Some(gate) = weak.upgrade() {
                gate.apply(generation, suitable);
            }
        });

        let mut state = self.state.lock();
        if state.alive && state.generation == generation {
            state.evaluation = Some(handle);
        }
    }

    async fn evaluate(bindings: &[Binding]) -> bool {
        for binding in bindings {
            let Some(test) = &binding.test else {
                return false;
            };
            let passed = test.assert(&binding.condition.expected).await;
            if passed == binding.condition.negated {
                return false;
            }
        }
        true
    }

    fn apply(&self, generation: u64, suitable: bool) {
        let topic = {
            let mut state = self.state.lock();
            if !state.alive || state.generation != generation {
                debug!(emitter = %self.emitter, generation, "[Gate] Discarding stale evaluation");
                return;
            }
            state.evaluation = None;

            let was_ready = state.ready;
            let previous = state.suitable;
            state.ready = true;
            state.suitable = suitable;

            if !was_ready {
                topics::READY
            } else if previous != suitable {
                topics::CHANGE
            } else {
                return;
            }
        };

        debug!(
            emitter = %self.emitter,
            expression = %self.expression,
            suitable,
            topic,
            "[Gate] Suitability evaluated"
        );
        self.bus
            .publish(self.emitter, topic, json!({ "suitable": suitable }));
    }

    /// Stop watching tests, abandon in-flight evaluation and leave the bus.
    pub fn destroy(&self) {
        let mut subscriptions = {
            let mut state = self.state.lock();
            if !state.alive {
                return;
            }
            state.alive = false;
            if let Some(evaluation) = state.evaluation.take() {
                evaluation.abort();
            }
            std::mem::take(&mut state.subscriptions)
        };
        subscriptions.clear(&self.bus);
        self.bus.remove_emitter(self.emitter);
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    pub fn emitter(&self) -> EmitterId {
        self.emitter
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Result of the latest evaluation. False until the first one completes.
    pub fn is_suitable(&self) -> bool {
        let state = self.state.lock();
        state.alive && state.suitable
    }

    /// Whether the first evaluation has completed.
    pub fn is_ready(&self) -> bool {
        self.state.lock().ready
    }

    /// Whether any condition is declared.
    pub fn is_conditioned(&self) -> bool {
        !self.expression.is_empty()
    }

    pub fn is_alive(&self) -> bool {
        self.state.lock().alive
    }
}
