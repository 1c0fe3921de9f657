//! Outbound (Driven) ports for the module controller.
//!
//! Resolution turns a candidate path into a factory and may suspend.
//! Instantiation through the factory is synchronous.

use crate::domain::{Module, ModuleContext};
use async_trait::async_trait;
use shared_types::{ModuleError, ResolveError};
use std::sync::Arc;

/// Builds module instances for one candidate path.
pub trait ModuleFactory: Send + Sync {
    /// # Errors
    ///
    /// Returns `ModuleError::Instantiation` when the constructor fails.
    fn create(&self, context: ModuleContext) -> Result<Box<dyn Module>, ModuleError>;
}

impl<F> ModuleFactory for F
where
    F: Fn(ModuleContext) -> Result<Box<dyn Module>, ModuleError> + Send + Sync,
{
    fn create(&self, context: ModuleContext) -> Result<Box<dyn Module>, ModuleError> {
        self(context)
    }
}

/// Resolves candidate paths into factories.
#[async_trait]
pub trait ModuleResolver: Send + Sync {
    async fn resolve(&self, path: &str) -> Result<Arc<dyn ModuleFactory>, ResolveError>;
}
