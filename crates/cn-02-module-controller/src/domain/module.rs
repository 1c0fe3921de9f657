//! # Module Contract
//!
//! A module is a live instance of a candidate. Instead of reflecting over
//! an object, callers reach a module through its named capability table.

use serde_json::Value;
use shared_bus::EventBus;
use shared_types::{attributes, EmitterId, HostRef, ModuleError};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A named method exposed by a module.
pub type Method = Arc<dyn Fn(&[Value]) -> Result<Value, ModuleError> + Send + Sync>;

/// Named-method table.
#[derive(Clone, Default)]
pub struct Capabilities {
    methods: BTreeMap<String, Method>,
}

impl Capabilities {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Capabilities::insert`].
    #[must_use]
    pub fn with<F>(mut self, name: impl Into<String>, method: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, ModuleError> + Send + Sync + 'static,
    {
        self.insert(name, method);
        self
    }

    pub fn insert<F>(&mut self, name: impl Into<String>, method: F)
    where
        F: Fn(&[Value]) -> Result<Value, ModuleError> + Send + Sync + 'static,
    {
        self.methods.insert(name.into(), Arc::new(method));
    }

    pub fn get(&self, name: &str) -> Option<&Method> {
        self.methods.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.methods.keys()).finish()
    }
}

/// A live candidate instance.
pub trait Module: Send {
    fn capabilities(&self) -> &Capabilities;

    /// Teardown hook, called once before the instance is released.
    fn unload(&mut self) {}
}

/// Everything a factory gets to build a module.
#[derive(Clone)]
pub struct ModuleContext {
    pub host: Option<HostRef>,
    pub options: Value,
    pub bus: Arc<EventBus>,
    /// The module's own emitter. Its events are propagated to the
    /// controller and from there to the node.
    pub emitter: EmitterId,
}

impl ModuleContext {
    /// Publish on the module's own emitter.
    pub fn publish(&self, topic: &str, payload: Value) {
        self.bus.publish(self.emitter, topic, payload);
    }

    /// Option value by key, if the options are an object.
    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }
}

/// Common module plumbing: marks the host initialized while the module is
/// loaded and clears the mark on unload.
pub struct BaseModule {
    context: ModuleContext,
    capabilities: Capabilities,
}

impl BaseModule {
    pub fn new(context: ModuleContext, capabilities: Capabilities) -> Self {
        if let Some(host) = &context.host {
            host.set_attribute(attributes::INITIALIZED, "true");
        }
        Self {
            context,
            capabilities,
        }
    }

    pub fn context(&self) -> &ModuleContext {
        &self.context
    }
}

impl Module for BaseModule {
    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    fn unload(&mut self) {
        if let Some(host) = &self.context.host {
            host.remove_attribute(attributes::INITIALIZED);
        }
    }
}
