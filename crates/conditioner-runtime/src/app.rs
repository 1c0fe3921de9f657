//! # Demo Run
//!
//! ```text
//! manifest ─→ toggles + hosts ─→ registry.load ─→ settle ─→ report
//!          ─→ flip toggles     ─→ settle        ─→ report ─→ destroy
//! ```

use crate::config::RuntimeConfig;
use crate::demo;
use crate::manifest::Manifest;
use anyhow::{Context, Result};
use cn_01_condition_gate::TestRegistry;
use cn_02_module_controller::StaticResolver;
use cn_04_registry::Registry;
use shared_bus::EventBus;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Active candidate of one node at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeReport {
    pub host: String,
    pub priority: i32,
    pub active: Option<String>,
}

/// Snapshots taken before and after the toggles were flipped.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub before: Vec<NodeReport>,
    pub after: Vec<NodeReport>,
    pub flipped: Vec<String>,
}

fn snapshot(registry: &Registry) -> Vec<NodeReport> {
    registry
        .nodes()
        .iter()
        .map(|node| NodeReport {
            host: node.host().id().to_owned(),
            priority: node.priority(),
            active: node
                .active_module_controller()
                .filter(|controller| controller.is_module_active())
                .map(|controller| controller.path().to_owned()),
        })
        .collect()
}

fn log_snapshot(stage: &str, nodes: &[NodeReport]) {
    for node in nodes {
        info!(
            stage,
            host = %node.host,
            priority = node.priority,
            active = node.active.as_deref().unwrap_or("none"),
            "Node state"
        );
    }
}

/// Run the demo described by `manifest` to completion.
///
/// # Errors
///
/// Fails on an invalid manifest or registry construction error.
pub async fn run(config: &RuntimeConfig, manifest: &Manifest) -> Result<RunReport> {
    let settle = Duration::from_millis(config.settle_ms);
    let bus = Arc::new(EventBus::new());

    let resolver = StaticResolver::new();
    demo::register(&resolver);

    let tests = Arc::new(TestRegistry::new());
    let toggles = manifest
        .register_toggles(&bus, &tests)
        .context("registering toggle tests")?;

    let registry = Registry::new(
        Arc::clone(&bus),
        Arc::new(resolver),
        tests,
        config.registry.clone(),
    )
    .context("building registry")?;

    let hosts = manifest.build_hosts().context("building host tree")?;
    let loaded = registry.load(&hosts).context("loading nodes")?;
    info!(hosts = hosts.len(), nodes = loaded.len(), "Registry loaded");

    tokio::time::sleep(settle).await;
    let before = snapshot(&registry);
    log_snapshot("initial", &before);

    let mut flipped = Vec::new();
    for toggle in &toggles {
        if let Some(value) = &toggle.flip_to {
            if toggle.test.set(value.as_str()) {
                info!(key = %toggle.key, value = %value, "Toggle flipped");
                flipped.push(toggle.key.clone());
            }
        }
    }

    tokio::time::sleep(settle).await;
    let after = snapshot(&registry);
    log_snapshot("flipped", &after);

    registry.destroy();
    info!(events = bus.events_published(), "Registry destroyed");

    Ok(RunReport {
        before,
        after,
        flipped,
    })
}
