//! # CN-04 Registry
//!
//! The facade applications talk to. A `Registry` is constructed explicitly
//! over a bus, a module resolver and a condition-test registry, builds one
//! node per host and answers lookups over the nodes it built.
//!
//! ## Modules
//!
//! - `config`: `RegistryConfig`, attribute names and default options
//! - `discovery`: host attributes → candidate descriptors
//! - `query`: `Query`, text or host lookups
//! - `registry`: `Registry`, loading, lookup and teardown
//!
//! ## Example
//!
//! ```rust,ignore
//! let registry = Registry::new(bus, resolver, tests, RegistryConfig::default())?;
//! registry.load(&hosts)?;
//! for controller in registry.get_behavior("ui/menu") {
//!     println!("{} active: {}", controller.path(), controller.is_module_active());
//! }
//! registry.destroy();
//! ```

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod config;
pub mod discovery;
pub mod error;
pub mod query;
pub mod registry;

pub use config::RegistryConfig;
pub use discovery::discover;
pub use error::{ConfigError, RegistryError, RegistryResult};
pub use query::Query;
pub use registry::Registry;
