//! Arbitration properties: at most one active candidate, priority order
//! independent of resolution timing, conditioned candidates holding their
//! slot.

use crate::fixtures::{active_name, host, settle, EventLog, Harness};
use shared_bus::topics;
use shared_types::attributes;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Running count of loaded candidates and the highest value it reached.
#[derive(Default)]
struct ActiveCounter {
    current: AtomicI64,
    peak: AtomicI64,
}

impl ActiveCounter {
    fn loaded(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn unloaded(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn test_at_most_one_active_while_conditions_flip() {
    let harness = Harness::new();
    let wide = harness.toggle("wide", "on");
    let touch = harness.toggle("touch", "off");

    let node = harness.node(
        "menu",
        &[("alpha", "wide:{on}"), ("beta", "touch:{on}"), ("gamma", "")],
    );

    let counter = Arc::new(ActiveCounter::default());
    for controller in node.controllers() {
        let loads = Arc::clone(&counter);
        harness
            .bus
            .subscribe(controller.emitter(), topics::LOAD, move |_| loads.loaded());
        let unloads = Arc::clone(&counter);
        harness
            .bus
            .subscribe(controller.emitter(), topics::UNLOAD, move |_| unloads.unloaded());
    }

    settle().await;
    assert_eq!(active_name(&node).as_deref(), Some("alpha"));

    let steps = [
        (&wide, "off"),
        (&touch, "on"),
        (&wide, "on"),
        (&touch, "off"),
        (&wide, "off"),
        (&touch, "on"),
    ];
    for (toggle, value) in steps {
        toggle.set(value);
        settle().await;

        let active = node
            .controllers()
            .iter()
            .filter(|c| c.is_module_active())
            .count();
        assert!(active <= 1, "{active} candidates active after {value}");
    }

    assert_eq!(counter.peak.load(Ordering::SeqCst), 1);
    assert_eq!(counter.current.load(Ordering::SeqCst), 1);
    assert_eq!(active_name(&node).as_deref(), Some("beta"));
}

#[tokio::test]
async fn test_priority_wins_regardless_of_resolution_order() {
    let harness = Harness::delayed(&[("alpha", 60), ("gamma", 20)]);
    let node = harness.node("slot", &[("alpha", ""), ("beta", ""), ("gamma", "")]);

    let logs: Vec<EventLog> = node
        .controllers()
        .iter()
        .map(|c| EventLog::attach(&harness.bus, c.emitter(), &[topics::LOAD]))
        .collect();

    // beta and gamma resolved, alpha still pending: nothing may load yet.
    tokio::time::sleep(Duration::from_millis(35)).await;
    assert!(!node.has_loaded_module());
    assert!(node.controllers()[1].has_initialized());
    assert!(!node.controllers()[0].has_initialized());

    settle().await;
    settle().await;
    assert_eq!(active_name(&node).as_deref(), Some("alpha"));
    assert_eq!(logs[0].entries(), vec!["load:alpha".to_string()]);
    assert!(logs[1].entries().is_empty());
    assert!(logs[2].entries().is_empty());
}

#[tokio::test]
async fn test_newly_available_candidate_preempts_unconditioned() {
    let harness = Harness::new();
    let mode = harness.toggle("mode", "off");
    let registry = harness.registry();

    let target = host(
        "panel",
        &[(
            attributes::MODULE,
            r#"[{"path": "alpha"}, {"path": "beta", "conditions": "mode:{on}"}]"#,
        )],
    );
    let nodes = registry.load(&[target]).unwrap();
    settle().await;
    assert_eq!(active_name(&nodes[0]).as_deref(), Some("alpha"));

    mode.set("on");
    settle().await;
    assert_eq!(active_name(&nodes[0]).as_deref(), Some("beta"));
}

#[tokio::test]
async fn test_conditioned_active_candidate_is_not_preempted() {
    let harness = Harness::new();
    harness.toggle("mode", "on");
    let feature = harness.toggle("feature", "on");
    let registry = harness.registry();

    let target = host(
        "panel",
        &[(
            attributes::MODULE,
            r#"[{"path": "beta", "conditions": "mode:{on}"},
                {"path": "alpha", "conditions": "feature:{on}"}]"#,
        )],
    );
    let nodes = registry.load(&[target]).unwrap();
    settle().await;
    assert_eq!(active_name(&nodes[0]).as_deref(), Some("beta"));

    feature.set("off");
    settle().await;
    feature.set("on");
    settle().await;

    let alpha = nodes[0].module_controller(Some("alpha")).unwrap();
    assert!(alpha.is_module_available());
    assert!(!alpha.is_module_active());
    assert_eq!(active_name(&nodes[0]).as_deref(), Some("beta"));
}

#[tokio::test]
async fn test_registry_loads_higher_priority_first() {
    let harness = Harness::new();
    let registry = harness.registry();

    let low = host("low", &[(attributes::MODULE, "alpha")]);
    let high = host(
        "high",
        &[(attributes::MODULE, "beta"), (attributes::PRIORITY, "5")],
    );
    let negative = host(
        "negative",
        &[(attributes::MODULE, "gamma"), (attributes::PRIORITY, "-1")],
    );
    let loaded = registry.load(&[low, negative, high]).unwrap();

    let order: Vec<String> = loaded.iter().map(|n| n.host().id().to_owned()).collect();
    assert_eq!(order, vec!["high", "low", "negative"]);
}
