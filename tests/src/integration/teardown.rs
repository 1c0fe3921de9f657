//! Teardown: nothing fires after destroy, even when resolution completes
//! later.

use crate::fixtures::{host, settle, Harness};
use cn_04_registry::RegistryError;
use shared_types::attributes;

#[tokio::test]
async fn test_registry_destroy_before_resolution() {
    let harness = Harness::held();
    let mode = harness.toggle("mode", "on");
    let registry = harness.registry();

    let hosts = vec![
        host("a", &[(attributes::MODULE, "alpha")]),
        host(
            "b",
            &[(attributes::MODULE, "beta"), (attributes::CONDITIONS, "mode:{on}")],
        ),
    ];
    let nodes = registry.load(&hosts).unwrap();
    settle().await;

    let controllers = nodes[0].module_controllers(None);
    assert_eq!(controllers.len(), 1);
    assert!(!controllers[0].has_initialized());
    assert!(hosts[0].has_attribute(attributes::PROCESSED));

    registry.destroy();
    let published = harness.bus.events_published();

    harness.release();
    mode.set("off");
    settle().await;

    assert_eq!(harness.bus.events_published(), published + 1);
    assert!(!controllers[0].has_initialized());
    assert!(!controllers[0].is_module_active());
    assert!(hosts.iter().all(|h| !h.has_attribute(attributes::PROCESSED)));
    assert_eq!(registry.node_count(), 0);
}

#[tokio::test]
async fn test_load_after_destroy_fails() {
    let harness = Harness::new();
    let registry = harness.registry();
    registry.destroy();

    let result = registry.load(&[host("late", &[(attributes::MODULE, "alpha")])]);
    assert!(matches!(result, Err(RegistryError::Destroyed)));
}

#[tokio::test]
async fn test_unloaded_host_can_be_loaded_again() {
    let harness = Harness::new();
    let registry = harness.registry();
    let target = host("slot", &[(attributes::MODULE, "alpha")]);

    registry.load(&[target.clone()]).unwrap();
    // Processed hosts are skipped.
    assert!(registry.load(&[target.clone()]).unwrap().is_empty());

    assert!(registry.unload_node(&target));
    assert!(!registry.unload_node(&target));
    assert_eq!(registry.load(&[target]).unwrap().len(), 1);
}
