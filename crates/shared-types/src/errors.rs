//! # Error Types
//!
//! Defines the error taxonomy shared across the conditioner crates.
//!
//! Only `ConstructionError` ever reaches a caller as a hard failure. The
//! others are absorbed at the component boundary where they occur and turned
//! into a non-available or non-active state plus a diagnostic.

use thiserror::Error;

/// Contract violations detected while building a controller graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstructionError {
    /// A candidate was declared without an implementation path.
    #[error("candidate path is a required parameter")]
    MissingPath,

    /// A node was requested without a host.
    #[error("host is a required parameter")]
    MissingHost,

    /// A node was built with an empty candidate list.
    #[error("node {host} expects at least one module controller")]
    NoCandidates { host: String },

    /// A condition test was registered without a key.
    #[error("condition test key is a required parameter")]
    MissingTestKey,

    /// Controllers spawn resolution and evaluation tasks and need a runtime.
    #[error("no tokio runtime available to drive asynchronous resolution")]
    NoRuntime,
}

/// Failure to resolve a candidate path into a factory.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// Nothing is registered under the path.
    #[error("no module registered under {path}")]
    NotFound { path: String },

    /// The resolver found the path but could not produce a factory.
    #[error("failed to resolve {path}: {reason}")]
    Failed { path: String, reason: String },
}

/// Failures raised by module instances.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModuleError {
    /// The module constructor failed.
    #[error("instantiation failed: {0}")]
    Instantiation(String),

    /// A named method failed.
    #[error("method {method} failed: {reason}")]
    Method { method: String, reason: String },

    /// `load()` was called on a controller whose candidate is not available.
    #[error("module {path} is not available")]
    NotAvailable { path: String },

    /// `load()` was called on a destroyed controller.
    #[error("module controller for {path} was destroyed")]
    Destroyed { path: String },
}

impl ModuleError {
    /// Shorthand for a method failure.
    pub fn method(method: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Method {
            method: method.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConstructionError::NoCandidates { host: "nav".into() };
        assert!(err.to_string().contains("nav"));

        let err = ResolveError::Failed {
            path: "ui/menu".into(),
            reason: "syntax error".into(),
        };
        let display = err.to_string();
        assert!(display.contains("ui/menu"));
        assert!(display.contains("syntax error"));

        let err = ModuleError::method("open", "already open");
        assert_eq!(err.to_string(), "method open failed: already open");
    }
}
