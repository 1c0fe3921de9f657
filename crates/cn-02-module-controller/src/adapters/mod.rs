//! Adapters for the module controller.

pub mod static_resolver;

pub use static_resolver::StaticResolver;
