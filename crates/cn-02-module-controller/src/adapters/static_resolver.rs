//! # Static Resolver
//!
//! Resolves paths from an in-memory table of factories registered up front.
//! Resolution can optionally be held until a release flag is raised, which
//! lets callers observe controllers while resolution is still in flight.

use crate::ports::{ModuleFactory, ModuleResolver};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::ResolveError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

#[derive(Default)]
pub struct StaticResolver {
    factories: RwLock<HashMap<String, Arc<dyn ModuleFactory>>>,
    release: Option<watch::Receiver<bool>>,
    resolutions: AtomicU64,
}

impl StaticResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A resolver whose resolutions wait until `true` is sent on the
    /// returned channel.
    #[must_use]
    pub fn held() -> (Self, watch::Sender<bool>) {
        let (sender, receiver) = watch::channel(false);
        let resolver = Self {
            release: Some(receiver),
            ..Self::default()
        };
        (resolver, sender)
    }

    /// Register `factory` under `path`.
    pub fn register<F>(&self, path: impl Into<String>, factory: F)
    where
        F: ModuleFactory + 'static,
    {
        self.register_factory(path, Arc::new(factory));
    }

    pub fn register_factory(&self, path: impl Into<String>, factory: Arc<dyn ModuleFactory>) {
        self.factories.write().insert(path.into(), factory);
    }

    /// Completed resolutions, successful or not.
    pub fn resolutions(&self) -> u64 {
        self.resolutions.load(Ordering::Relaxed)
    }

    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<_> = self.factories.read().keys().cloned().collect();
        paths.sort();
        paths
    }
}

#[async_trait]
impl ModuleResolver for StaticResolver {
    async fn resolve(&self, path: &str) -> Result<Arc<dyn ModuleFactory>, ResolveError> {
        if let Some(release) = &self.release {
            let mut release = release.clone();
            if release.wait_for(|released| *released).await.is_err() {
                return Err(ResolveError::Failed {
                    path: path.to_owned(),
                    reason: "resolver released without a value".into(),
                });
            }
        }

        self.resolutions.fetch_add(1, Ordering::Relaxed);
        let factory = self.factories.read().get(path).cloned();
        debug!(path = %path, found = factory.is_some(), "[Resolver] Resolved");
        factory.ok_or_else(|| ResolveError::NotFound {
            path: path.to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BaseModule, Capabilities, Module, ModuleContext};
    use shared_types::ModuleError;
    use std::time::Duration;

    fn base(context: ModuleContext) -> Result<Box<dyn Module>, ModuleError> {
        Ok(Box::new(BaseModule::new(context, Capabilities::new())))
    }

    #[tokio::test]
    async fn test_resolves_registered_paths() {
        let resolver = StaticResolver::new();
        resolver.register("ui/menu", base);

        assert!(resolver.resolve("ui/menu").await.is_ok());
        assert_eq!(
            resolver.resolve("ui/missing").await.err(),
            Some(ResolveError::NotFound {
                path: "ui/missing".into()
            })
        );
        assert_eq!(resolver.resolutions(), 2);
        assert_eq!(resolver.paths(), vec!["ui/menu".to_string()]);
    }

    #[tokio::test]
    async fn test_held_until_released() {
        let (resolver, release) = StaticResolver::held();
        resolver.register("ui/menu", base);
        let resolver = Arc::new(resolver);

        let task = {
            let resolver = Arc::clone(&resolver);
            tokio::spawn(async move { resolver.resolve("ui/menu").await.is_ok() })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(resolver.resolutions(), 0);

        release.send(true).unwrap();
        assert!(task.await.unwrap());
        assert_eq!(resolver.resolutions(), 1);
    }
}
