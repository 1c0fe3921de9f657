//! # Host Manifest
//!
//! JSON description of the host tree and the toggle condition tests the
//! demo runs against.
//!
//! ```json
//! {
//!   "toggles": [{ "key": "viewport", "value": "wide", "flip_to": "narrow" }],
//!   "hosts": [
//!     { "id": "page" },
//!     { "id": "nav", "parent": "page",
//!       "attributes": { "data-module": "demo/echo", "data-conditions": "viewport:{wide}" } }
//!   ]
//! }
//! ```
//!
//! Parents must be declared before their children.

use cn_01_condition_gate::{TestRegistry, ToggleTest};
use serde::Deserialize;
use shared_bus::EventBus;
use shared_types::{ConstructionError, Host, HostRef};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed manifest: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("host {0} is declared twice")]
    DuplicateHost(String),

    #[error("host {host} names unknown parent {parent}")]
    UnknownParent { host: String, parent: String },

    #[error(transparent)]
    Construction(#[from] ConstructionError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct HostDecl {
    pub id: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToggleDecl {
    pub key: String,
    pub value: String,
    /// Value the toggle is flipped to after the first report.
    #[serde(default)]
    pub flip_to: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub toggles: Vec<ToggleDecl>,
    #[serde(default)]
    pub hosts: Vec<HostDecl>,
}

/// A registered toggle and the value it should be flipped to, if any.
pub struct Toggle {
    pub key: String,
    pub test: Arc<ToggleTest>,
    pub flip_to: Option<String>,
}

const DEMO: &str = r#"{
  "toggles": [
    { "key": "viewport", "value": "wide", "flip_to": "narrow" },
    { "key": "session", "value": "guest" }
  ],
  "hosts": [
    { "id": "page" },
    { "id": "nav", "parent": "page",
      "attributes": {
        "data-module": "[{\"path\": \"demo/echo\", \"conditions\": \"viewport:{wide}\", \"options\": {\"label\": \"wide menu\"}}, {\"path\": \"demo/counter\"}]",
        "data-priority": "10"
      } },
    { "id": "greeting", "parent": "page",
      "attributes": { "data-module": "demo/echo", "data-conditions": "not session:{member}" } }
  ]
}"#;

impl Manifest {
    /// # Errors
    ///
    /// Returns `ManifestError::Parse` for malformed JSON.
    pub fn from_json(json: &str) -> Result<Self, ManifestError> {
        Ok(serde_json::from_str(json)?)
    }

    /// # Errors
    ///
    /// Fails when the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// The built-in demo manifest.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the document is embedded.
    pub fn demo() -> Result<Self, ManifestError> {
        Self::from_json(DEMO)
    }

    /// Build the host tree, in declaration order.
    ///
    /// # Errors
    ///
    /// Rejects duplicate ids and parents that were not declared earlier.
    pub fn build_hosts(&self) -> Result<Vec<HostRef>, ManifestError> {
        let mut built: HashMap<&str, HostRef> = HashMap::with_capacity(self.hosts.len());
        let mut hosts = Vec::with_capacity(self.hosts.len());

        for decl in &self.hosts {
            if built.contains_key(decl.id.as_str()) {
                return Err(ManifestError::DuplicateHost(decl.id.clone()));
            }
            let host = match &decl.parent {
                None => Host::new(decl.id.as_str()),
                Some(parent) => {
                    let parent_host =
                        built
                            .get(parent.as_str())
                            .ok_or_else(|| ManifestError::UnknownParent {
                                host: decl.id.clone(),
                                parent: parent.clone(),
                            })?;
                    Host::with_parent(decl.id.as_str(), parent_host)
                }
            };
            for (name, value) in &decl.attributes {
                host.set_attribute(name.as_str(), value.as_str());
            }
            built.insert(decl.id.as_str(), host.clone());
            hosts.push(host);
        }
        Ok(hosts)
    }

    /// Create a toggle test per declaration and register it under its key.
    ///
    /// # Errors
    ///
    /// Returns a construction error for a blank key.
    pub fn register_toggles(
        &self,
        bus: &Arc<EventBus>,
        tests: &TestRegistry,
    ) -> Result<Vec<Toggle>, ManifestError> {
        self.toggles
            .iter()
            .map(|decl| -> Result<Toggle, ManifestError> {
                let test = ToggleTest::new(Arc::clone(bus), decl.value.as_str());
                tests.register_test(decl.key.as_str(), test.clone())?;
                Ok(Toggle {
                    key: decl.key.clone(),
                    test,
                    flip_to: decl.flip_to.clone(),
                })
            })
            .collect()
    }
}
