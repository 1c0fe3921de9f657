//! Error types for the registry.

use shared_types::ConstructionError;
use thiserror::Error;

/// Invalid registry configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("attribute name for {field} must not be empty")]
    EmptyAttribute { field: &'static str },

    #[error("attributes {first} and {second} share the name {name}")]
    DuplicateAttribute {
        first: &'static str,
        second: &'static str,
        name: String,
    },

    #[error("default options for {path} must be a JSON object")]
    InvalidDefaultOptions { path: String },

    #[error("malformed configuration: {0}")]
    Parse(String),
}

/// Failures building or querying node graphs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error(transparent)]
    Construction(#[from] ConstructionError),

    /// The module attribute of a host could not be turned into candidates.
    #[error("invalid module declaration on {host}: {reason}")]
    InvalidDeclaration { host: String, reason: String },

    #[error("registry has been destroyed")]
    Destroyed,
}

pub type RegistryResult<T> = Result<T, RegistryError>;
