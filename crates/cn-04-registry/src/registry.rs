//! # Registry
//!
//! Explicitly constructed facade over one bus, one resolver and one test
//! registry. Builds a node per host and answers lookups over the nodes it
//! built.
//!
//! ```text
//! load(hosts) ─→ skip processed ─→ sort by priority (desc, stable)
//!             ─→ discover candidates ─→ ModuleController × N ─→ NodeController
//! ```

use crate::config::RegistryConfig;
use crate::discovery;
use crate::error::{ConfigError, RegistryError, RegistryResult};
use crate::query::Query;
use cn_01_condition_gate::{ConditionTest, TestRegistry};
use cn_02_module_controller::{ControllerContext, ModuleController, ModuleResolver};
use cn_03_node_controller::{NodeContext, NodeController};
use parking_lot::RwLock;
use shared_bus::EventBus;
use shared_types::{CandidateDescriptor, ConstructionError, HostRef, SelectorMatcher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct Registry {
    config: RegistryConfig,
    controllers: ControllerContext,
    node_context: NodeContext,
    nodes: RwLock<Vec<Arc<NodeController>>>,
    destroyed: AtomicBool,
}

impl Registry {
    /// Build a registry.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` when `config` does not validate.
    pub fn new(
        bus: Arc<EventBus>,
        resolver: Arc<dyn ModuleResolver>,
        tests: Arc<TestRegistry>,
        config: RegistryConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let node_context = NodeContext {
            priority_attribute: config.priority_attribute.clone(),
            processed_attribute: config.processed_attribute.clone(),
            ..NodeContext::new(Arc::clone(&bus))
        };
        info!(
            module_attribute = %config.module_attribute,
            default_options = config.default_options.len(),
            "[Registry] Initialized"
        );

        Ok(Self {
            config,
            controllers: ControllerContext {
                bus,
                resolver,
                tests,
            },
            node_context,
            nodes: RwLock::new(Vec::new()),
            destroyed: AtomicBool::new(false),
        })
    }

    /// Replace the selector matcher used by `get_nodes`/`get_behavior`.
    #[must_use]
    pub fn with_matcher(mut self, matcher: Arc<dyn SelectorMatcher>) -> Self {
        self.node_context.matcher = matcher;
        self
    }

    // =========================================================================
    // CONDITION TESTS
    // =========================================================================

    /// Register a condition test for gates built after this call.
    ///
    /// # Errors
    ///
    /// Returns `ConstructionError::MissingTestKey` for a blank key.
    pub fn register_test(
        &self,
        key: impl Into<String>,
        test: Arc<dyn ConditionTest>,
    ) -> Result<(), ConstructionError> {
        self.controllers.tests.register_test(key, test)
    }

    pub fn get_test_by_key(&self, key: &str) -> Option<Arc<dyn ConditionTest>> {
        self.controllers.tests.get_test_by_key(key)
    }

    // =========================================================================
    // LOADING
    // =========================================================================

    /// Build nodes for every unprocessed host that declares candidates.
    /// Higher-priority hosts are built first; equal priorities keep the
    /// given order.
    ///
    /// # Errors
    ///
    /// Stops at the first host whose declaration is invalid. Nodes built
    /// before that host stay registered.
    pub fn load(&self, hosts: &[HostRef]) -> RegistryResult<Vec<Arc<NodeController>>> {
        let mut pending: Vec<(i32, &HostRef)> = hosts
            .iter()
            .filter(|host| {
                let processed = NodeController::has_processed(host, &self.config.processed_attribute);
                if processed {
                    debug!(host = %host.id(), "[Registry] Skipping processed host");
                }
                !processed && host.has_attribute(&self.config.module_attribute)
            })
            .map(|host| (self.priority_of(host), host))
            .collect();
        pending.sort_by(|a, b| b.0.cmp(&a.0));

        let mut loaded = Vec::with_capacity(pending.len());
        for (_, host) in pending {
            let descriptors = discovery::discover(host, &self.config)?;
            loaded.push(self.load_node(host.clone(), descriptors)?);
        }
        Ok(loaded)
    }

    /// Build one node for `host` over `descriptors`.
    ///
    /// # Errors
    ///
    /// Returns a construction error for an empty candidate list or when no
    /// tokio runtime is available, and `RegistryError::Destroyed` after
    /// teardown.
    pub fn load_node(
        &self,
        host: HostRef,
        descriptors: Vec<CandidateDescriptor>,
    ) -> RegistryResult<Arc<NodeController>> {
        if self.destroyed.load(Ordering::Acquire) {
            return Err(RegistryError::Destroyed);
        }

        let mut controllers = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            match ModuleController::new(descriptor, &self.controllers) {
                Ok(controller) => controllers.push(controller),
                Err(err) => {
                    for controller in &controllers {
                        controller.destroy();
                    }
                    warn!(host = %host.id(), error = %err, "[Registry] Failed to build candidate");
                    return Err(err.into());
                }
            }
        }

        let node = NodeController::new(host, controllers, &self.node_context)?;
        info!(
            host = %node.host().id(),
            priority = node.priority(),
            candidates = node.controllers().len(),
            "[Registry] Node loaded"
        );
        self.nodes.write().push(Arc::clone(&node));
        Ok(node)
    }

    fn priority_of(&self, host: &HostRef) -> i32 {
        host.attribute(&self.config.priority_attribute)
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(0)
    }

    // =========================================================================
    // LOOKUP
    // =========================================================================

    /// Nodes whose host is the queried host, or which match a text query by
    /// candidate path or selector.
    pub fn get_nodes(&self, query: impl Into<Query>) -> Vec<Arc<NodeController>> {
        let query = query.into();
        self.nodes
            .read()
            .iter()
            .filter(|node| match &query {
                Query::Host(host) => Arc::ptr_eq(node.host(), host),
                Query::Text(text) => {
                    node.module_controller(Some(text.as_str())).is_some()
                        || node.matches_selector(text, None)
                }
            })
            .cloned()
            .collect()
    }

    /// Module controllers matching the query: every controller of a queried
    /// or selector-matched host, and controllers whose path equals a text
    /// query.
    pub fn get_behavior(&self, query: impl Into<Query>) -> Vec<Arc<ModuleController>> {
        let query = query.into();
        let nodes = self.nodes.read();
        let mut behavior = Vec::new();
        for node in nodes.iter() {
            match &query {
                Query::Host(host) if Arc::ptr_eq(node.host(), host) => {
                    behavior.extend(node.module_controllers(None));
                }
                Query::Host(_) => {}
                Query::Text(text) if node.matches_selector(text, None) => {
                    behavior.extend(node.module_controllers(None));
                }
                Query::Text(text) => behavior.extend(node.module_controllers(Some(text.as_str()))),
            }
        }
        behavior
    }

    pub fn node_count(&self) -> usize {
        self.nodes.read().len()
    }

    pub fn nodes(&self) -> Vec<Arc<NodeController>> {
        self.nodes.read().clone()
    }

    // =========================================================================
    // TEARDOWN
    // =========================================================================

    /// Destroy the node built for `host`. Returns whether there was one.
    pub fn unload_node(&self, host: &HostRef) -> bool {
        let node = {
            let mut nodes = self.nodes.write();
            let Some(index) = nodes.iter().position(|n| Arc::ptr_eq(n.host(), host)) else {
                return false;
            };
            nodes.remove(index)
        };
        node.destroy();
        info!(host = %host.id(), "[Registry] Node unloaded");
        true
    }

    /// Destroy every node. Loading afterwards fails.
    pub fn destroy(&self) {
        if self.destroyed.swap(true, Ordering::AcqRel) {
            return;
        }
        let nodes = std::mem::take(&mut *self.nodes.write());
        let count = nodes.len();
        for node in nodes {
            node.destroy();
        }
        info!(nodes = count, "[Registry] Destroyed");
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.controllers.bus
    }
}
