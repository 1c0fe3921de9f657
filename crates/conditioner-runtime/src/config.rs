//! # Runtime Configuration
//!
//! Loaded from an optional JSON file, then overridden from the environment:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `CONDITIONER_LOG_LEVEL` | `log_level` |
//! | `CONDITIONER_MANIFEST` | `manifest` |

use cn_04_registry::{ConfigError, RegistryConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub const ENV_LOG_LEVEL: &str = "CONDITIONER_LOG_LEVEL";
pub const ENV_MANIFEST: &str = "CONDITIONER_MANIFEST";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Error)]
pub enum RuntimeConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed runtime configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unknown log level {0:?}, expected one of trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("settle delay must be positive")]
    ZeroSettleDelay,

    #[error(transparent)]
    Registry(#[from] ConfigError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Default log level when `RUST_LOG` is unset.
    pub log_level: String,
    /// Host manifest. The built-in demo manifest is used when unset.
    pub manifest: Option<PathBuf>,
    /// How long to let resolution and evaluation tasks run before reporting.
    pub settle_ms: u64,
    pub registry: RegistryConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            manifest: None,
            settle_ms: 50,
            registry: RegistryConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Read `path` if given, apply environment overrides and validate.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or parsed, or the result does not
    /// validate.
    pub fn load(path: Option<&Path>) -> Result<Self, RuntimeConfigError> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| RuntimeConfigError::Io {
                    path: path.to_owned(),
                    source,
                })?;
                serde_json::from_str(&text)?
            }
            None => Self::default(),
        };

        config.apply_overrides(
            std::env::var(ENV_LOG_LEVEL).ok(),
            std::env::var(ENV_MANIFEST).ok(),
        );
        config.validate()?;
        Ok(config)
    }

    /// Apply values taken from the environment. Blank values are ignored.
    pub fn apply_overrides(&mut self, log_level: Option<String>, manifest: Option<String>) {
        if let Some(level) = log_level.filter(|v| !v.trim().is_empty()) {
            info!(level = %level, "Log level overridden from environment");
            self.log_level = level.trim().to_lowercase();
        }
        if let Some(manifest) = manifest.filter(|v| !v.trim().is_empty()) {
            self.manifest = Some(PathBuf::from(manifest.trim()));
        }
    }

    /// # Errors
    ///
    /// Returns the first invalid setting.
    pub fn validate(&self) -> Result<(), RuntimeConfigError> {
        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(RuntimeConfigError::InvalidLogLevel(self.log_level.clone()));
        }
        if self.settle_ms == 0 {
            return Err(RuntimeConfigError::ZeroSettleDelay);
        }
        self.registry.validate()?;
        Ok(())
    }
}
