//! # Module Controller
//!
//! Owns the lifecycle of one candidate: waits for its gate, resolves the
//! candidate path into a factory, instantiates on `load()` and tears the
//! instance down on `unload()`.
//!
//! ## Events (published on the controller's emitter)
//!
//! | Topic | When |
//! |-------|------|
//! | `init` | first resolution attempt finished, or the gate was unsuitable at startup |
//! | `available` | resolved and suitable |
//! | `unavailable` | gate flipped to unsuitable while available or active |
//! | `load` | instance created |
//! | `unload` | instance torn down |
//! | `error` | resolution or instantiation failed |
//!
//! Events of the live instance are propagated to the controller's emitter.
//!
//! No lock is held while publishing; every publish is the last thing a
//! transition does.

use crate::domain::{ControllerPhase, Module, ModuleContext};
use crate::ports::{ModuleFactory, ModuleResolver};
use cn_01_condition_gate::{ConditionGate, TestRegistry};
use parking_lot::Mutex;
use serde_json::{json, Value};
use shared_bus::{topics, EventBus, SubscriptionSet};
use shared_types::{
    CandidateDescriptor, ConstructionError, EmitterId, ExecuteResponse, HostRef, ModuleError,
    ResolveError,
};
use std::fmt;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Collaborators shared by every controller built from one registry.
#[derive(Clone)]
pub struct ControllerContext {
    pub bus: Arc<EventBus>,
    pub resolver: Arc<dyn ModuleResolver>,
    pub tests: Arc<TestRegistry>,
}

struct LiveModule {
    module: Box<dyn Module>,
    emitter: EmitterId,
}

#[derive(Default)]
struct ControllerState {
    phase: ControllerPhase,
    /// Set once the gate's first evaluation has been handled.
    started: bool,
    initialized: bool,
    factory: Option<Arc<dyn ModuleFactory>>,
    instance: Option<LiveModule>,
    /// Latched resolution or instantiation failure.
    failure: Option<String>,
    loading: bool,
    destroyed: bool,
    resolution: Option<JoinHandle<()>>,
    subscriptions: SubscriptionSet,
}

pub struct ModuleController {
    emitter: EmitterId,
    descriptor: CandidateDescriptor,
    bus: Arc<EventBus>,
    resolver: Arc<dyn ModuleResolver>,
    runtime: Handle,
    gate: Arc<ConditionGate>,
    state: Mutex<ControllerState>,
}

impl ModuleController {
    /// Build a controller for `descriptor`.
    ///
    /// Must be called from within a tokio runtime, which drives gate
    /// evaluation and path resolution.
    ///
    /// # Errors
    ///
    /// Returns `ConstructionError::NoRuntime` outside a runtime.
    pub fn new(
        descriptor: CandidateDescriptor,
        context: &ControllerContext,
    ) -> Result<Arc<Self>, ConstructionError> {
        let runtime = Handle::try_current().map_err(|_| ConstructionError::NoRuntime)?;
        let gate = ConditionGate::new(
            descriptor.conditions(),
            Arc::clone(&context.bus),
            &context.tests,
            runtime.clone(),
        );

        let controller = Arc::new(Self {
            emitter: EmitterId::new(),
            descriptor,
            bus: Arc::clone(&context.bus),
            resolver: Arc::clone(&context.resolver),
            runtime,
            gate,
            state: Mutex::new(ControllerState::default()),
        });
        debug!(
            path = %controller.path(),
            emitter = %controller.emitter,
            conditions = %controller.gate.expression(),
            "[Module] Controller created"
        );

        controller.watch_gate();
        if controller.gate.is_ready() {
            controller.on_gate_ready();
        }
        Ok(controller)
    }

    fn watch_gate(self: &Arc<Self>) {
        let gate = self.gate.emitter();
        let mut state = self.state.lock();

        let weak = Arc::downgrade(self);
        state.subscriptions.subscribe(&self.bus, gate, topics::READY, move |_| {
            if let Some(controller) = weak.upgrade() {
                controller.on_gate_ready();
            }
        });

        let weak = Arc::downgrade(self);
        state.subscriptions.subscribe(&self.bus, gate, topics::CHANGE, move |_| {
            if let Some(controller) = weak.upgrade() {
                controller.on_gate_change();
            }
        });
    }

    // =========================================================================
    // GATE REACTIONS
    // =========================================================================

    fn on_gate_ready(self: &Arc<Self>) {
        let suitable = self.gate.is_suitable();
        {
            let mut state = self.state.lock();
            if state.destroyed || state.started {
                return;
            }
            state.started = true;
            if !suitable {
                // Initialized without resolving; resolution waits for suitability.
                state.initialized = true;
            }
        }

        if suitable {
            self.start_resolution();
        } else {
            debug!(path = %self.path(), "[Module] Unsuitable at startup, resolution deferred");
            self.publish(topics::INIT, Value::Null);
        }
    }

    fn on_gate_change(self: &Arc<Self>) {
        if !self.state.lock().started {
            self.on_gate_ready();
            return;
        }
        if self.gate.is_suitable() {
            self.on_suitable();
        } else {
            self.on_unsuitable();
        }
    }

    fn on_suitable(self: &Arc<Self>) {
        {
            let mut state = self.state.lock();
            if state.destroyed || state.failure.is_some() {
                return;
            }
            if state.factory.is_some() {
                if state.phase != ControllerPhase::Idle {
                    return;
                }
                state.phase = ControllerPhase::Available;
            } else {
                drop(state);
                self.start_resolution();
                return;
            }
        }

        info!(path = %self.path(), "[Module] Available");
        self.publish(topics::AVAILABLE, Value::Null);
    }

    fn on_unsuitable(&self) {
        let phase = {
            let mut state = self.state.lock();
            if state.destroyed {
                return;
            }
            match state.phase {
                ControllerPhase::Available | ControllerPhase::Initializing => {
                    let phase = state.phase;
                    state.phase = ControllerPhase::Idle;
                    phase
                }
                phase => phase,
            }
        };

        match phase {
            ControllerPhase::Active => {
                self.unload();
            }
            ControllerPhase::Available => {}
            // Resolution keeps running; its result is stored without announcing availability.
            ControllerPhase::Initializing | ControllerPhase::Idle | ControllerPhase::Unloading => {
                return
            }
        }

        info!(path = %self.path(), "[Module] Unavailable");
        self.publish(topics::UNAVAILABLE, Value::Null);
    }

    // =========================================================================
    // RESOLUTION
    // =========================================================================

    fn start_resolution(self: &Arc<Self>) {
        let mut state = self.state.lock();
        if state.destroyed
            || state.resolution.is_some()
            || state.factory.is_some()
            || state.failure.is_some()
        {
            return;
        }
        state.phase = ControllerPhase::Initializing;

        let weak = Arc::downgrade(self);
        let resolver = Arc::clone(&self.resolver);
        let path = self.path().to_owned();
        debug!(path = %path, "[Module] Resolving");
        state.resolution = Some(self.runtime.spawn(async move {
            let result = resolver.resolve(&path).await;
            if let Some(controller) = weak.upgrade() {
                controller.on_resolved(result);
            }
        }));
    }

    fn on_resolved(&self, result: Result<Arc<dyn ModuleFactory>, ResolveError>) {
        let suitable = self.gate.is_suitable();
        let newly_initialized;
        let mut became_available = false;
        let failure = {
            let mut state = self.state.lock();
            if state.destroyed {
                debug!(path = %self.path(), "[Module] Ignoring resolution after teardown");
                return;
            }
            state.resolution = None;
            newly_initialized = !state.initialized;
            state.initialized = true;

            match result {
                Ok(factory) => {
                    state.factory = Some(factory);
                    // Idle here means the gate flipped while resolution was in flight.
                    if matches!(state.phase, ControllerPhase::Idle | ControllerPhase::Initializing) {
                        became_available = suitable;
                        state.phase = if suitable {
                            ControllerPhase::Available
                        } else {
                            ControllerPhase::Idle
                        };
                    }
                    None
                }
                Err(err) => {
                    let reason = err.to_string();
                    state.failure = Some(reason.clone());
                    state.phase = ControllerPhase::Idle;
                    Some(reason)
                }
            }
        };

        if let Some(reason) = failure {
            warn!(path = %self.path(), error = %reason, "[Module] Resolution failed");
            self.publish(topics::ERROR, json!({ "reason": reason }));
        } else if became_available {
            info!(path = %self.path(), "[Module] Available");
            self.publish(topics::AVAILABLE, Value::Null);
        }
        if newly_initialized {
            debug!(path = %self.path(), "[Module] Initialized");
            self.publish(topics::INIT, Value::Null);
        }
    }

    // =========================================================================
    // LOAD / UNLOAD
    // =========================================================================

    /// Instantiate the candidate. Loading an active controller is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `ModuleError::NotAvailable` when the candidate is not
    /// available, `ModuleError::Destroyed` after teardown and the factory's
    /// error when instantiation fails. An instantiation failure is latched.
    pub fn load(&self) -> Result<(), ModuleError> {
        let (factory, context) = {
            let mut state = self.state.lock();
            if state.destroyed {
                return Err(ModuleError::Destroyed {
                    path: self.path().to_owned(),
                });
            }
            if state.phase == ControllerPhase::Active || state.loading {
                return Ok(());
            }
            let factory = match &state.factory {
                Some(factory) if self.is_available_locked(&state) => Arc::clone(factory),
                _ => {
                    return Err(ModuleError::NotAvailable {
                        path: self.path().to_owned(),
                    })
                }
            };
            state.loading = true;
            let context = ModuleContext {
                host: self.descriptor.host().cloned(),
                options: self.descriptor.options().clone(),
                bus: Arc::clone(&self.bus),
                emitter: EmitterId::new(),
            };
            (factory, context)
        };

        let module_emitter = context.emitter;
        self.bus.propagate(module_emitter, self.emitter);
        let created = factory.create(context);

        let mut state = self.state.lock();
        state.loading = false;
        if state.destroyed {
            drop(state);
            if let Ok(mut module) = created {
                module.unload();
            }
            self.bus.remove_emitter(module_emitter);
            return Err(ModuleError::Destroyed {
                path: self.path().to_owned(),
            });
        }

        match created {
            Ok(module) => {
                state.instance = Some(LiveModule {
                    module,
                    emitter: module_emitter,
                });
                state.phase = ControllerPhase::Active;
                drop(state);

                info!(path = %self.path(), "[Module] Loaded");
                self.publish(topics::LOAD, Value::Null);
                Ok(())
            }
            Err(err) => {
                state.failure = Some(err.to_string());
                state.phase = ControllerPhase::Idle;
                drop(state);

                self.bus.remove_emitter(module_emitter);
                warn!(path = %self.path(), error = %err, "[Module] Instantiation failed");
                self.publish(topics::ERROR, json!({ "reason": err.to_string() }));
                Err(err)
            }
        }
    }

    /// Tear down the live instance. Returns whether there was one.
    pub fn unload(&self) -> bool {
        let mut live = {
            let mut state = self.state.lock();
            match state.instance.take() {
                Some(live) => {
                    state.phase = ControllerPhase::Unloading;
                    live
                }
                None => return false,
            }
        };

        live.module.unload();
        self.bus.stop_propagating(live.emitter, self.emitter);
        self.bus.remove_emitter(live.emitter);
        drop(live);

        {
            let mut state = self.state.lock();
            let available = self.is_available_locked(&state);
            state.phase = if available {
                ControllerPhase::Available
            } else {
                ControllerPhase::Idle
            };
        }

        info!(path = %self.path(), "[Module] Unloaded");
        self.publish(topics::UNLOAD, Value::Null);
        true
    }

    /// Call a named method on the live instance.
    pub fn execute(&self, method: &str, args: &[Value]) -> ExecuteResponse {
        let callable = {
            let state = self.state.lock();
            state
                .instance
                .as_ref()
                .and_then(|live| live.module.capabilities().get(method).cloned())
        };

        let Some(callable) = callable else {
            return ExecuteResponse::not_found();
        };
        match callable(args) {
            Ok(response) => ExecuteResponse::ok(response),
            Err(err) => {
                debug!(path = %self.path(), method, error = %err, "[Module] Method failed");
                ExecuteResponse::failed(err.to_string())
            }
        }
    }

    /// Unload, drop every bus registration and abandon pending resolution.
    /// Anything that completes afterwards is ignored.
    pub fn destroy(&self) {
        let (resolution, mut subscriptions) = {
            let mut state = self.state.lock();
            if state.destroyed {
                return;
            }
            state.destroyed = true;
            (
                state.resolution.take(),
                std::mem::take(&mut state.subscriptions),
            )
        };

        self.unload();
        subscriptions.clear(&self.bus);
        self.gate.destroy();
        if let Some(resolution) = resolution {
            resolution.abort();
        }
        self.state.lock().phase = ControllerPhase::Idle;
        self.bus.remove_emitter(self.emitter);
        debug!(path = %self.path(), "[Module] Controller destroyed");
    }

    fn publish(&self, topic: &str, extra: Value) {
        let mut payload = json!({ "path": self.path() });
        if let (Some(payload), Value::Object(extra)) = (payload.as_object_mut(), extra) {
            payload.extend(extra);
        }
        self.bus.publish(self.emitter, topic, payload);
    }

    fn is_available_locked(&self, state: &ControllerState) -> bool {
        state.factory.is_some()
            && state.failure.is_none()
            && !state.destroyed
            && self.gate.is_suitable()
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    pub fn emitter(&self) -> EmitterId {
        self.emitter
    }

    pub fn descriptor(&self) -> &CandidateDescriptor {
        &self.descriptor
    }

    pub fn path(&self) -> &str {
        self.descriptor.path()
    }

    pub fn host(&self) -> Option<&HostRef> {
        self.descriptor.host()
    }

    pub fn gate(&self) -> &Arc<ConditionGate> {
        &self.gate
    }

    pub fn phase(&self) -> ControllerPhase {
        self.state.lock().phase
    }

    /// Latched failure reason, if resolution or instantiation failed.
    pub fn failure(&self) -> Option<String> {
        self.state.lock().failure.clone()
    }

    pub fn has_initialized(&self) -> bool {
        self.state.lock().initialized
    }

    /// Resolved, suitable and not failed.
    pub fn is_module_available(&self) -> bool {
        let state = self.state.lock();
        self.is_available_locked(&state)
    }

    /// Declares conditions and currently satisfies them.
    pub fn is_module_conditioned(&self) -> bool {
        self.gate.is_conditioned() && self.gate.is_suitable()
    }

    pub fn is_module_active(&self) -> bool {
        self.state.lock().phase == ControllerPhase::Active
    }

    pub fn matches_path(&self, path: &str) -> bool {
        self.path() == path
    }
}

impl fmt::Debug for ModuleController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleController")
            .field("path", &self.path())
            .field("emitter", &self.emitter)
            .field("phase", &self.phase())
            .finish()
    }
}
