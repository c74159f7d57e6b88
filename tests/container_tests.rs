//! Container reconciliation against a recording fake runtime

mod common;

use common::{FakeRuntime, World, CONTAINER_ID};
use neurolaunch::config::ContainerConfig;
use neurolaunch::container::{ContainerReconciler, ReconcileAction};
use neurolaunch::error::{BootstrapError, ProvisionStage};
use neurolaunch::AccelMode;

fn config() -> ContainerConfig {
    ContainerConfig::default()
}

/// Absent container is pulled then created without the GPU flag in CPU mode
#[test]
fn test_absent_container_is_created() {
    let runtime = FakeRuntime::new(World::default());
    let config = config();

    let running = ContainerReconciler::new(&runtime, &config)
        .reconcile(AccelMode::Disabled)
        .unwrap();

    assert_eq!(running.action, ReconcileAction::Created);
    assert_eq!(running.id, CONTAINER_ID);
    assert_eq!(
        runtime.calls(),
        vec!["exists ollama", "pull ollama/ollama:latest", "run ollama"]
    );

    let spec = &runtime.runs()[0];
    assert!(spec.accel_args.is_empty());
    assert_eq!(spec.port, (11434, 11434));
    assert_eq!(spec.volume, "ollama:/root/.ollama");
}

#[test]
fn test_absent_container_created_with_accel() {
    let runtime = FakeRuntime::new(World::default());
    let config = config();

    ContainerReconciler::new(&runtime, &config)
        .reconcile(AccelMode::Enabled)
        .unwrap();

    assert_eq!(runtime.runs()[0].accel_args, vec!["--gpus", "all"]);
}

/// Pull failure on the creation path is fatal and nothing is created
#[test]
fn test_pull_failure_on_create_is_fatal() {
    let runtime = FakeRuntime::new(World {
        latest_image: None,
        ..World::default()
    });
    let config = config();

    let result = ContainerReconciler::new(&runtime, &config).reconcile(AccelMode::Disabled);

    assert!(matches!(
        result,
        Err(BootstrapError::Provision { stage: ProvisionStage::Pull, .. })
    ));
    assert!(runtime.calls_to("run").is_empty());
}

#[test]
fn test_create_failure_is_fatal() {
    let runtime = FakeRuntime::new(World {
        run_fails: true,
        ..World::default()
    });
    let config = config();

    let result = ContainerReconciler::new(&runtime, &config).reconcile(AccelMode::Disabled);

    assert!(matches!(
        result,
        Err(BootstrapError::Provision { stage: ProvisionStage::Create, .. })
    ));
}

/// Running container on the latest image: only the drift-check pull happens
#[test]
fn test_current_running_container_is_noop() {
    let runtime = FakeRuntime::running_with(&[]);
    let config = config();

    let running = ContainerReconciler::new(&runtime, &config)
        .reconcile(AccelMode::Disabled)
        .unwrap();

    assert_eq!(running.action, ReconcileAction::Unchanged);
    assert_eq!(runtime.calls_to("pull").len(), 1);
    assert!(runtime.calls_to("run").is_empty());
    assert!(runtime.calls_to("stop").is_empty());
    assert!(runtime.calls_to("remove").is_empty());
    assert!(runtime.calls_to("start").is_empty());
}

/// Image drift triggers stop, remove, create, in that order
#[test]
fn test_drift_recreates_container() {
    let runtime = FakeRuntime::new(World {
        exists: true,
        running: true,
        container_image: "sha256:old".to_string(),
        latest_image: Some("sha256:new".to_string()),
        ..World::default()
    });
    let config = config();

    let running = ContainerReconciler::new(&runtime, &config)
        .reconcile(AccelMode::Disabled)
        .unwrap();

    assert_eq!(running.action, ReconcileAction::Recreated);
    let mutations: Vec<String> = runtime
        .calls()
        .into_iter()
        .filter(|c| c.starts_with("stop") || c.starts_with("remove") || c.starts_with("run"))
        .collect();
    assert_eq!(mutations, vec!["stop ollama", "remove ollama", "run ollama"]);
    assert_eq!(runtime.world().container_image, "sha256:new");
}

/// A stopped but stale container is also recreated rather than started
#[test]
fn test_drift_on_stopped_container_recreates() {
    let runtime = FakeRuntime::new(World {
        exists: true,
        running: false,
        container_image: "sha256:old".to_string(),
        latest_image: Some("sha256:new".to_string()),
        ..World::default()
    });
    let config = config();

    let running = ContainerReconciler::new(&runtime, &config)
        .reconcile(AccelMode::Disabled)
        .unwrap();

    assert_eq!(running.action, ReconcileAction::Recreated);
    assert!(runtime.calls_to("start").is_empty());
    assert!(runtime.world().running);
}

/// Failed update check is treated as "no update available"
#[test]
fn test_drift_check_failure_is_not_fatal() {
    let runtime = FakeRuntime::new(World {
        exists: true,
        running: true,
        latest_image: None,
        ..World::default()
    });
    let config = config();

    let running = ContainerReconciler::new(&runtime, &config)
        .reconcile(AccelMode::Disabled)
        .unwrap();

    assert_eq!(running.action, ReconcileAction::Unchanged);
    assert!(runtime.calls_to("remove").is_empty());
    assert!(runtime.calls_to("run").is_empty());
}

/// Pull succeeds but the pulled image cannot be inspected: keep the container
#[test]
fn test_image_inspect_failure_is_not_fatal() {
    let runtime = FakeRuntime::new(World {
        exists: true,
        running: true,
        latest_image: Some("sha256:newer".to_string()),
        image_inspect_fails: true,
        ..World::default()
    });
    let config = config();

    let running = ContainerReconciler::new(&runtime, &config)
        .reconcile(AccelMode::Disabled)
        .unwrap();

    assert_eq!(running.action, ReconcileAction::Unchanged);
    assert_eq!(runtime.calls_to("pull").len(), 1);
    assert_eq!(runtime.calls_to("image_id").len(), 1);
    for verb in ["stop", "remove", "run"] {
        assert!(runtime.calls_to(verb).is_empty(), "unexpected {} call", verb);
    }
}

#[test]
fn test_stopped_current_container_is_started() {
    let runtime = FakeRuntime::new(World {
        exists: true,
        running: false,
        ..World::default()
    });
    let config = config();

    let running = ContainerReconciler::new(&runtime, &config)
        .reconcile(AccelMode::Disabled)
        .unwrap();

    assert_eq!(running.action, ReconcileAction::Started);
    assert_eq!(runtime.calls_to("start"), vec!["start ollama"]);
    assert!(runtime.calls_to("run").is_empty());
}

#[test]
fn test_start_failure_is_fatal() {
    let runtime = FakeRuntime::new(World {
        exists: true,
        running: false,
        start_fails: true,
        ..World::default()
    });
    let config = config();

    let result = ContainerReconciler::new(&runtime, &config).reconcile(AccelMode::Disabled);

    assert!(matches!(
        result,
        Err(BootstrapError::Provision { stage: ProvisionStage::Start, .. })
    ));
}
