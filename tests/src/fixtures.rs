//! Shared fixtures: a harness wiring bus, resolver and tests together, a
//! resolver with per-path delays, and an event recorder.

use async_trait::async_trait;
use cn_01_condition_gate::{TestRegistry, ToggleTest};
use cn_02_module_controller::{
    BaseModule, Capabilities, ControllerContext, Module, ModuleContext, ModuleController,
    ModuleFactory, ModuleResolver, StaticResolver,
};
use cn_03_node_controller::{NodeContext, NodeController};
use cn_04_registry::{Registry, RegistryConfig};
use parking_lot::Mutex;
use serde_json::{json, Value};
use shared_bus::EventBus;
use shared_types::{CandidateDescriptor, EmitterId, Host, HostRef, ModuleError, ResolveError};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Let spawned resolution and evaluation tasks run.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

/// Factory for a module that answers `name()` with `name` and `add(a, b…)`
/// with the sum of its integer arguments.
pub fn named(name: &'static str) -> impl ModuleFactory {
    move |context: ModuleContext| -> Result<Box<dyn Module>, ModuleError> {
        let capabilities = Capabilities::new()
            .with("name", move |_: &[Value]| Ok(json!(name)))
            .with("add", |args: &[Value]| {
                Ok(json!(args.iter().filter_map(Value::as_i64).sum::<i64>()))
            });
        Ok(Box::new(BaseModule::new(context, capabilities)))
    }
}

fn broken(_: ModuleContext) -> Result<Box<dyn Module>, ModuleError> {
    Err(ModuleError::Instantiation("constructor failed".into()))
}

/// Registers `alpha`, `beta`, `gamma` and `broken`.
pub fn populated_resolver(resolver: &StaticResolver) {
    resolver.register("alpha", named("alpha"));
    resolver.register("beta", named("beta"));
    resolver.register("gamma", named("gamma"));
    resolver.register("broken", broken);
}

/// Resolver that sleeps for a per-path delay before delegating.
pub struct DelayedResolver {
    inner: StaticResolver,
    delays: HashMap<String, Duration>,
}

impl DelayedResolver {
    pub fn new(delays: &[(&str, u64)]) -> Self {
        let inner = StaticResolver::new();
        populated_resolver(&inner);
        Self {
            inner,
            delays: delays
                .iter()
                .map(|(path, ms)| ((*path).to_owned(), Duration::from_millis(*ms)))
                .collect(),
        }
    }
}

#[async_trait]
impl ModuleResolver for DelayedResolver {
    async fn resolve(&self, path: &str) -> Result<Arc<dyn ModuleFactory>, ResolveError> {
        if let Some(delay) = self.delays.get(path) {
            tokio::time::sleep(*delay).await;
        }
        self.inner.resolve(path).await
    }
}

pub struct Harness {
    pub bus: Arc<EventBus>,
    pub tests: Arc<TestRegistry>,
    pub resolver: Arc<dyn ModuleResolver>,
    release: Option<watch::Sender<bool>>,
}

impl Harness {
    pub fn new() -> Self {
        let resolver = StaticResolver::new();
        populated_resolver(&resolver);
        Self::with_resolver(Arc::new(resolver), None)
    }

    /// Resolution is held until [`Harness::release`].
    pub fn held() -> Self {
        let (resolver, release) = StaticResolver::held();
        populated_resolver(&resolver);
        Self::with_resolver(Arc::new(resolver), Some(release))
    }

    pub fn delayed(delays: &[(&str, u64)]) -> Self {
        Self::with_resolver(Arc::new(DelayedResolver::new(delays)), None)
    }

    fn with_resolver(
        resolver: Arc<dyn ModuleResolver>,
        release: Option<watch::Sender<bool>>,
    ) -> Self {
        Self {
            bus: Arc::new(EventBus::new()),
            tests: Arc::new(TestRegistry::new()),
            resolver,
            release,
        }
    }

    pub fn release(&self) {
        if let Some(release) = &self.release {
            release.send_replace(true);
        }
    }

    pub fn toggle(&self, key: &str, initial: &str) -> Arc<ToggleTest> {
        let toggle = ToggleTest::new(Arc::clone(&self.bus), initial);
        self.tests
            .register_test(key, toggle.clone())
            .expect("toggle key is not blank");
        toggle
    }

    pub fn controller_context(&self) -> ControllerContext {
        ControllerContext {
            bus: Arc::clone(&self.bus),
            resolver: Arc::clone(&self.resolver),
            tests: Arc::clone(&self.tests),
        }
    }

    pub fn controller(&self, path: &str, conditions: &str) -> Arc<ModuleController> {
        let descriptor = CandidateDescriptor::new(path)
            .expect("path is not blank")
            .with_conditions(conditions);
        ModuleController::new(descriptor, &self.controller_context())
            .expect("called inside a runtime")
    }

    /// A node on a fresh host over `(path, conditions)` candidates.
    pub fn node(&self, id: &str, candidates: &[(&str, &str)]) -> Arc<NodeController> {
        let host = Host::new(id);
        let controllers = candidates
            .iter()
            .map(|(path, conditions)| {
                let descriptor = CandidateDescriptor::new(*path)
                    .expect("path is not blank")
                    .with_conditions(*conditions)
                    .with_host(host.clone());
                ModuleController::new(descriptor, &self.controller_context())
                    .expect("called inside a runtime")
            })
            .collect();
        NodeController::new(host, controllers, &NodeContext::new(Arc::clone(&self.bus)))
            .expect("candidates declared")
    }

    pub fn registry(&self) -> Registry {
        Registry::new(
            Arc::clone(&self.bus),
            Arc::clone(&self.resolver),
            Arc::clone(&self.tests),
            RegistryConfig::default(),
        )
        .expect("default config is valid")
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

/// Host with the given attributes.
pub fn host(id: &str, attributes: &[(&str, &str)]) -> HostRef {
    let host = Host::new(id);
    for (name, value) in attributes {
        host.set_attribute(*name, *value);
    }
    host
}

/// Records `topic:path` for events seen on one emitter.
#[derive(Clone, Default)]
pub struct EventLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl EventLog {
    pub fn attach(bus: &EventBus, emitter: EmitterId, topics: &[&str]) -> Self {
        let log = Self::default();
        for topic in topics {
            let entries = Arc::clone(&log.entries);
            bus.subscribe(emitter, topic, move |event| {
                let path = event.payload["path"].as_str().unwrap_or("-");
                entries.lock().push(format!("{}:{}", event.topic, path));
            });
        }
        log
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

/// Name reported by the node's active module, if any.
pub fn active_name(node: &NodeController) -> Option<String> {
    let response = node.execute("name", &[]);
    if response.is_ok() {
        response.response.as_str().map(str::to_owned)
    } else {
        None
    }
}
