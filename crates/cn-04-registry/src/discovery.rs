//! # Host Discovery
//!
//! Turns the module attribute of a host into candidate descriptors.
//!
//! A plain path declares a single candidate whose conditions come from the
//! conditions attribute:
//!
//! ```text
//! data-module="ui/menu" data-conditions="viewport:{wide}"
//! ```
//!
//! A JSON array declares several candidates, in precedence order:
//!
//! ```text
//! data-module='[{"path": "ui/menu", "conditions": "viewport:{wide}"},
//!               {"path": "ui/select", "options": {"compact": true}}]'
//! ```

use crate::config::RegistryConfig;
use crate::error::{RegistryError, RegistryResult};
use serde::Deserialize;
use serde_json::Value;
use shared_types::{CandidateDescriptor, HostRef};

#[derive(Debug, Deserialize)]
struct Declaration {
    path: String,
    #[serde(default)]
    conditions: String,
    #[serde(default)]
    options: Value,
}

/// Descriptors declared on `host`. Hosts without the module attribute
/// declare nothing.
///
/// # Errors
///
/// Returns `RegistryError::InvalidDeclaration` for a malformed JSON array
/// and a construction error for a blank path.
pub fn discover(host: &HostRef, config: &RegistryConfig) -> RegistryResult<Vec<CandidateDescriptor>> {
    let Some(declared) = host.attribute(&config.module_attribute) else {
        return Ok(Vec::new());
    };
    let declared = declared.trim();

    if declared.starts_with('[') {
        let declarations: Vec<Declaration> =
            serde_json::from_str(declared).map_err(|e| RegistryError::InvalidDeclaration {
                host: host.id().to_owned(),
                reason: e.to_string(),
            })?;
        return declarations
            .into_iter()
            .map(|d| describe(host, config, &d.path, d.conditions, d.options))
            .collect();
    }

    let conditions = host
        .attribute(&config.conditions_attribute)
        .unwrap_or_default();
    Ok(vec![describe(host, config, declared, conditions, Value::Null)?])
}

fn describe(
    host: &HostRef,
    config: &RegistryConfig,
    path: &str,
    conditions: String,
    options: Value,
) -> RegistryResult<CandidateDescriptor> {
    let path = path.trim();
    let descriptor = CandidateDescriptor::new(path)?
        .with_conditions(conditions)
        .with_options(config.options_for(path, options))
        .with_host(host.clone());
    Ok(descriptor)
}
