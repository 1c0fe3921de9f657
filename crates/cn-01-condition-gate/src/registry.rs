//! # Test Registry
//!
//! Maps condition keys to test implementations. Gates look tests up once,
//! when they are constructed.

use crate::ports::ConditionTest;
use parking_lot::RwLock;
use shared_types::ConstructionError;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Default)]
pub struct TestRegistry {
    tests: RwLock<HashMap<String, Arc<dyn ConditionTest>>>,
}

impl TestRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `test` under `key`, replacing any previous test.
    ///
    /// # Errors
    ///
    /// Returns `ConstructionError::MissingTestKey` for a blank key.
    pub fn register_test(
        &self,
        key: impl Into<String>,
        test: Arc<dyn ConditionTest>,
    ) -> Result<(), ConstructionError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(ConstructionError::MissingTestKey);
        }

        let previous = self.tests.write().insert(key.clone(), test);
        if previous.is_some() {
            warn!(key = %key, "[Tests] Condition test already registered, replacing");
        } else {
            info!(key = %key, "[Tests] Registered condition test");
        }
        Ok(())
    }

    /// Look up the test registered under `key`.
    pub fn get_test_by_key(&self, key: &str) -> Option<Arc<dyn ConditionTest>> {
        self.tests.read().get(key).cloned()
    }

    pub fn is_registered(&self, key: &str) -> bool {
        self.tests.read().contains_key(key)
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.tests.read().keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl fmt::Debug for TestRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestRegistry").field("keys", &self.keys()).finish()
    }
}
