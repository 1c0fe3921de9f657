//! # Conditioner Runtime
//!
//! Library half of the demo executable.
//!
//! - `config`: `RuntimeConfig`, file plus environment overrides
//! - `manifest`: host tree and toggle tests from JSON
//! - `demo`: the `demo/echo` and `demo/counter` modules
//! - `app`: the run itself, returning before/after snapshots
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (file, then `CONDITIONER_*` environment)
//! 2. Initialize logging (`RUST_LOG` wins over the configured level)
//! 3. Read the manifest, or fall back to the built-in demo
//! 4. Register toggles and demo modules, load the registry
//! 5. Report, flip toggles, report again, tear down

pub mod app;
pub mod config;
pub mod demo;
pub mod manifest;

pub use app::{run, NodeReport, RunReport};
pub use config::{RuntimeConfig, RuntimeConfigError};
pub use manifest::{Manifest, ManifestError};
