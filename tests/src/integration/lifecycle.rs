//! Candidate lifecycle as observed through the node: reselection after an
//! unload, idempotent load and unload, the execute contract.

use crate::fixtures::{active_name, settle, EventLog, Harness};
use serde_json::json;
use shared_bus::topics;
use shared_types::{attributes, ExecuteResponse};

#[tokio::test]
async fn test_unsuitable_active_candidate_hands_over() {
    let harness = Harness::new();
    let wide = harness.toggle("wide", "on");
    let node = harness.node("menu", &[("alpha", "wide:{on}"), ("beta", "")]);
    let log = EventLog::attach(&harness.bus, node.emitter(), &[topics::LOAD, topics::UNLOAD]);

    settle().await;
    assert_eq!(log.entries(), vec!["load:alpha".to_string()]);
    log.clear();

    wide.set("off");
    settle().await;
    assert_eq!(
        log.entries(),
        vec!["unload:alpha".to_string(), "load:beta".to_string()]
    );
    assert_eq!(active_name(&node).as_deref(), Some("beta"));
    log.clear();

    // beta is unconditioned, so alpha takes the slot back. The node stops
    // listening to beta before unloading it.
    wide.set("on");
    settle().await;
    assert_eq!(log.entries(), vec!["load:alpha".to_string()]);
    assert!(!node.controllers()[1].is_module_active());
}

#[tokio::test]
async fn test_explicit_unload_rearbitrates() {
    let harness = Harness::new();
    let node = harness.node("slot", &[("alpha", ""), ("beta", "")]);
    let log = EventLog::attach(&harness.bus, node.emitter(), &[topics::LOAD, topics::UNLOAD]);
    settle().await;
    log.clear();

    let alpha = node.module_controller(Some("alpha")).unwrap();
    assert!(alpha.unload());
    settle().await;

    // alpha is still the first available candidate.
    assert_eq!(
        log.entries(),
        vec!["unload:alpha".to_string(), "load:alpha".to_string()]
    );
    assert!(alpha.is_module_active());
}

#[tokio::test]
async fn test_load_and_unload_are_idempotent() {
    let harness = Harness::new();
    let controller = harness.controller("alpha", "");
    let log = EventLog::attach(
        &harness.bus,
        controller.emitter(),
        &[topics::LOAD, topics::UNLOAD],
    );
    settle().await;
    assert!(controller.is_module_available());

    controller.load().unwrap();
    controller.load().unwrap();
    assert!(controller.unload());
    assert!(!controller.unload());

    assert_eq!(
        log.entries(),
        vec!["load:alpha".to_string(), "unload:alpha".to_string()]
    );
}

#[tokio::test]
async fn test_initialized_marker_follows_module() {
    let harness = Harness::new();
    let node = harness.node("slot", &[("alpha", "")]);
    settle().await;
    assert!(node.host().has_attribute(attributes::INITIALIZED));

    node.module_controller(None).unwrap().unload();
    // Reloaded straight away by the node.
    settle().await;
    assert!(node.host().has_attribute(attributes::INITIALIZED));

    node.destroy();
    assert!(!node.host().has_attribute(attributes::INITIALIZED));
}

#[tokio::test]
async fn test_execute_contract() {
    let harness = Harness::new();
    let node = harness.node("calc", &[("alpha", "")]);
    settle().await;

    let sum = node.execute("add", &[json!(1), json!(2)]);
    assert_eq!(sum, ExecuteResponse::ok(json!(3)));

    let missing = node.execute("multiply", &[]);
    assert_eq!(
        serde_json::to_value(&missing).unwrap(),
        json!({"status": 404, "response": null})
    );

    let idle = harness.node("idle", &[("broken", "")]);
    settle().await;
    assert!(!idle.has_loaded_module());
    assert_eq!(idle.execute("name", &[]).status, ExecuteResponse::NOT_FOUND);
}
