//! # Node Controller
//!
//! Arbitrates the candidates declared on one host so that at most one of
//! them is active at any time.
//!
//! ## Arbitration
//!
//! ```text
//! 1. wait for every controller's "init"
//! 2. activate the first available controller (declaration order),
//!    then listen for "available" on every controller
//! 3. "available" from X: ignored while another available controller is
//!    conditioned, otherwise X is activated
//! 4. "unload" from the active controller: re-scan and activate the first
//!    available controller, if any
//! ```
//!
//! Events of the active controller (and through it, of the live module) are
//! propagated to the node's emitter.

use cn_02_module_controller::ModuleController;
use parking_lot::Mutex;
use serde_json::Value;
use shared_bus::{topics, EventBus, SubscriptionId, SubscriptionSet};
use shared_types::{
    attributes, AttributeSelector, ConstructionError, EmitterId, ExecuteResponse, Host, HostRef,
    SelectorMatcher,
};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Collaborators and attribute names shared by every node of a registry.
#[derive(Clone)]
pub struct NodeContext {
    pub bus: Arc<EventBus>,
    pub matcher: Arc<dyn SelectorMatcher>,
    pub priority_attribute: String,
    pub processed_attribute: String,
}

impl NodeContext {
    /// Context with the attribute selector and the default attribute names.
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self {
            bus,
            matcher: Arc::new(AttributeSelector),
            priority_attribute: attributes::PRIORITY.to_owned(),
            processed_attribute: attributes::PROCESSED.to_owned(),
        }
    }
}

struct ActiveSlot {
    index: usize,
    unload_subscription: Option<SubscriptionId>,
}

#[derive(Default)]
struct NodeState {
    arbitrated: bool,
    destroyed: bool,
    active: Option<ActiveSlot>,
    init_subscriptions: SubscriptionSet,
    available_subscriptions: SubscriptionSet,
}

pub struct NodeController {
    emitter: EmitterId,
    host: HostRef,
    priority: i32,
    controllers: Vec<Arc<ModuleController>>,
    bus: Arc<EventBus>,
    matcher: Arc<dyn SelectorMatcher>,
    processed_attribute: String,
    state: Mutex<NodeState>,
}

impl NodeController {
    /// Build a node over `controllers`, in precedence order, and mark the
    /// host processed.
    ///
    /// # Errors
    ///
    /// Returns `ConstructionError::NoCandidates` for an empty list.
    pub fn new(
        host: HostRef,
        controllers: Vec<Arc<ModuleController>>,
        context: &NodeContext,
    ) -> Result<Arc<Self>, ConstructionError> {
        if controllers.is_empty() {
            warn!(host = %host.id(), "[Node] No candidates declared");
            return Err(ConstructionError::NoCandidates {
                host: host.id().to_owned(),
            });
        }

        let priority = host
            .attribute(&context.priority_attribute)
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(0);
        host.set_attribute(context.processed_attribute.as_str(), "true");

        let node = Arc::new(Self {
            emitter: EmitterId::new(),
            host,
            priority,
            controllers,
            bus: Arc::clone(&context.bus),
            matcher: Arc::clone(&context.matcher),
            processed_attribute: context.processed_attribute.clone(),
            state: Mutex::new(NodeState::default()),
        });
        debug!(
            host = %node.host.id(),
            priority,
            candidates = node.controllers.len(),
            "[Node] Created"
        );

        node.watch_init();
        node.check_initialized();
        Ok(node)
    }

    /// Whether `host` has already been claimed by a node, i.e. its
    /// processed attribute is `"true"`.
    pub fn has_processed(host: &Host, processed_attribute: &str) -> bool {
        host.attribute(processed_attribute).as_deref() == Some("true")
    }

    fn watch_init(self: &Arc<Self>) {
        let mut state = self.state.lock();
        for controller in self.controllers.iter().filter(|c| !c.has_initialized()) {
            let weak = Arc::downgrade(self);
            state
                .init_subscriptions
                .subscribe(&self.bus, controller.emitter(), topics::INIT, move |_| {
                    if let Some(node) = weak.upgrade() {
                        node.check_initialized();
                    }
                });
        }
    }

    fn watch_available(self: &Arc<Self>) {
        let mut state = self.state.lock();
        if state.destroyed {
            return;
        }
        for (index, controller) in self.controllers.iter().enumerate() {
            let weak = Arc::downgrade(self);
            state.available_subscriptions.subscribe(
                &self.bus,
                controller.emitter(),
                topics::AVAILABLE,
                move |_| {
                    if let Some(node) = weak.upgrade() {
                        node.on_module_available(index);
                    }
                },
            );
        }
    }

    // =========================================================================
    // ARBITRATION
    // =========================================================================

    fn check_initialized(self: &Arc<Self>) {
        if !self.controllers.iter().all(|c| c.has_initialized()) {
            return;
        }

        let mut init_subscriptions = {
            let mut state = self.state.lock();
            if state.destroyed || state.arbitrated {
                return;
            }
            state.arbitrated = true;
            std::mem::take(&mut state.init_subscriptions)
        };
        init_subscriptions.clear(&self.bus);

        debug!(host = %self.host.id(), "[Node] All candidates initialized");
        self.activate(self.first_available());
        self.watch_available();
    }

    fn on_module_available(self: &Arc<Self>, index: usize) {
        if self.state.lock().destroyed {
            return;
        }

        let blocked = self.controllers.iter().enumerate().any(|(other, controller)| {
            other != index && controller.is_module_available() && controller.is_module_conditioned()
        });
        if blocked {
            debug!(
                host = %self.host.id(),
                path = %self.controllers[index].path(),
                "[Node] Available candidate blocked by a conditioned candidate"
            );
            return;
        }
        self.set_active(index);
    }

    fn on_active_unload(self: &Arc<Self>, index: usize) {
        let is_active = {
            let state = self.state.lock();
            !state.destroyed && state.active.as_ref().map(|slot| slot.index) == Some(index)
        };
        if !is_active {
            return;
        }

        self.clean_active();
        self.activate(self.first_available());
    }

    fn first_available(&self) -> Option<usize> {
        self.controllers.iter().position(|c| c.is_module_available())
    }

    fn activate(self: &Arc<Self>, index: Option<usize>) {
        match index {
            Some(index) => self.set_active(index),
            None => debug!(host = %self.host.id(), "[Node] No available candidate"),
        }
    }

    fn set_active(self: &Arc<Self>, index: usize) {
        {
            let state = self.state.lock();
            if state.destroyed || state.active.as_ref().map(|slot| slot.index) == Some(index) {
                return;
            }
        }
        self.clean_active();

        let controller = Arc::clone(&self.controllers[index]);
        let weak = Arc::downgrade(self);
        let unload_subscription =
            self.bus
                .subscribe(controller.emitter(), topics::UNLOAD, move |_| {
                    if let Some(node) = weak.upgrade() {
                        node.on_active_unload(index);
                    }
                });
        self.state.lock().active = Some(ActiveSlot {
            index,
            unload_subscription,
        });
        self.bus.propagate(controller.emitter(), self.emitter);

        info!(host = %self.host.id(), path = %controller.path(), "[Node] Activating candidate");
        if let Err(err) = controller.load() {
            warn!(
                host = %self.host.id(),
                path = %controller.path(),
                error = %err,
                "[Node] Candidate failed to load, re-arbitrating"
            );
            self.clean_active();
            // The failed candidate is no longer available, so this terminates.
            self.activate(self.first_available());
        }
    }

    fn clean_active(&self) {
        let Some(slot) = self.state.lock().active.take() else {
            return;
        };
        let controller = &self.controllers[slot.index];
        if let Some(id) = slot.unload_subscription {
            self.bus.unsubscribe(controller.emitter(), topics::UNLOAD, id);
        }
        self.bus.stop_propagating(controller.emitter(), self.emitter);
        if controller.unload() {
            info!(host = %self.host.id(), path = %controller.path(), "[Node] Deactivated candidate");
        }
    }

    // =========================================================================
    // PUBLIC API
    // =========================================================================

    /// Forward a method call to the active candidate.
    pub fn execute(&self, method: &str, args: &[Value]) -> ExecuteResponse {
        match self.active_module_controller() {
            Some(controller) => controller.execute(method, args),
            None => ExecuteResponse::not_found(),
        }
    }

    pub fn active_module_controller(&self) -> Option<Arc<ModuleController>> {
        let state = self.state.lock();
        state
            .active
            .as_ref()
            .map(|slot| Arc::clone(&self.controllers[slot.index]))
    }

    pub fn has_loaded_module(&self) -> bool {
        self.active_module_controller()
            .is_some_and(|controller| controller.is_module_active())
    }

    /// First controller for `path`, or the first controller at all.
    pub fn module_controller(&self, path: Option<&str>) -> Option<Arc<ModuleController>> {
        self.controllers
            .iter()
            .find(|c| path.map_or(true, |path| c.matches_path(path)))
            .cloned()
    }

    /// Every controller for `path`, or all of them.
    pub fn module_controllers(&self, path: Option<&str>) -> Vec<Arc<ModuleController>> {
        self.controllers
            .iter()
            .filter(|c| path.map_or(true, |path| c.matches_path(path)))
            .cloned()
            .collect()
    }

    /// Whether the host matches `selector` and, when a context is given,
    /// lies inside it.
    pub fn matches_selector(&self, selector: &str, context: Option<&Host>) -> bool {
        if let Some(context) = context {
            if !context.contains(&self.host) {
                return false;
            }
        }
        self.matcher.matches(&self.host, selector)
    }

    /// Tear down every controller and release the host.
    pub fn destroy(&self) {
        let (mut init_subscriptions, mut available_subscriptions) = {
            let mut state = self.state.lock();
            if state.destroyed {
                return;
            }
            state.destroyed = true;
            (
                std::mem::take(&mut state.init_subscriptions),
                std::mem::take(&mut state.available_subscriptions),
            )
        };
        init_subscriptions.clear(&self.bus);
        available_subscriptions.clear(&self.bus);

        self.clean_active();
        for controller in &self.controllers {
            controller.destroy();
        }
        self.bus.remove_emitter(self.emitter);
        self.host.remove_attribute(&self.processed_attribute);
        info!(host = %self.host.id(), "[Node] Destroyed");
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn host(&self) -> &HostRef {
        &self.host
    }

    pub fn emitter(&self) -> EmitterId {
        self.emitter
    }

    pub fn controllers(&self) -> &[Arc<ModuleController>] {
        &self.controllers
    }

    pub fn is_destroyed(&self) -> bool {
        self.state.lock().destroyed
    }
}

impl fmt::Debug for NodeController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeController")
            .field("host", &self.host.id())
            .field("priority", &self.priority)
            .field("candidates", &self.controllers.len())
            .finish()
    }
}
