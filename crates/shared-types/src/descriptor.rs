//! # Candidate Descriptor
//!
//! The immutable input a module controller is built from. Produced by the
//! discovery layer, never mutated afterwards.

use crate::errors::ConstructionError;
use crate::host::HostRef;
use serde_json::Value;

/// One declared implementation option for a node.
#[derive(Debug, Clone)]
pub struct CandidateDescriptor {
    /// Identifier the resolver turns into a factory.
    path: String,
    /// Static options handed to the module constructor.
    options: Value,
    /// Condition-set expression; empty means "always suitable".
    conditions: String,
    /// Host the module is constructed against, if any.
    host: Option<HostRef>,
}

impl CandidateDescriptor {
    /// Create a descriptor for `path` with no options, conditions or host.
    ///
    /// # Errors
    ///
    /// Returns `ConstructionError::MissingPath` if `path` is blank.
    pub fn new(path: impl Into<String>) -> Result<Self, ConstructionError> {
        let path = path.into();
        if path.trim().is_empty() {
            return Err(ConstructionError::MissingPath);
        }
        Ok(Self {
            path,
            options: Value::Null,
            conditions: String::new(),
            host: None,
        })
    }

    /// Attach static options.
    #[must_use]
    pub fn with_options(mut self, options: Value) -> Self {
        self.options = options;
        self
    }

    /// Attach a condition-set expression.
    #[must_use]
    pub fn with_conditions(mut self, conditions: impl Into<String>) -> Self {
        self.conditions = conditions.into();
        self
    }

    /// Attach the host the module is constructed against.
    #[must_use]
    pub fn with_host(mut self, host: HostRef) -> Self {
        self.host = Some(host);
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn options(&self) -> &Value {
        &self.options
    }

    pub fn conditions(&self) -> &str {
        &self.conditions
    }

    pub fn host(&self) -> Option<&HostRef> {
        self.host.as_ref()
    }

    /// Whether any condition is declared.
    pub fn is_conditioned(&self) -> bool {
        !self.conditions.trim().is_empty()
    }
}
