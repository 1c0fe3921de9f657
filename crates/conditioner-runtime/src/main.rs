//! # Conditioner Runtime
//!
//! Usage: `conditioner-runtime [config.json]`
//!
//! Runs the demo manifest (or the one named by the configuration) through a
//! registry and prints which candidate every node activated.

use std::path::PathBuf;

use anyhow::{Context, Result};
use conditioner_runtime::{run, Manifest, RuntimeConfig};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("installing log subscriber")?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config =
        RuntimeConfig::load(config_path.as_deref()).context("loading runtime configuration")?;
    init_logging(&config.log_level)?;

    info!("===========================================");
    info!("  Conditioner Runtime v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");

    let manifest = match &config.manifest {
        Some(path) => {
            info!(path = %path.display(), "Loading manifest");
            Manifest::load(path).with_context(|| format!("reading {}", path.display()))?
        }
        None => {
            info!("No manifest configured, using the built-in demo");
            Manifest::demo().context("parsing built-in demo manifest")?
        }
    };

    let report = run(&config, &manifest).await?;
    for (before, after) in report.before.iter().zip(&report.after) {
        println!(
            "{:<16} priority {:>3}  {} -> {}",
            before.host,
            before.priority,
            before.active.as_deref().unwrap_or("-"),
            after.active.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}
