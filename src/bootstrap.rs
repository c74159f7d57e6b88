//! Bootstrap orchestrator
//!
//! Runs every stage in order and stops at the first error:
//!
//! ```text
//! runtime installed? → detect GPU → reconcile container → wait ready
//!      → ensure models (provision) → ensure models (verify) → launch plan
//! ```
//!
//! The result is a `LaunchPlan` whose preconditions have been checked; the
//! caller performs the actual exec.

use std::ffi::{OsStr, OsString};
use std::future::Future;
use std::time::{Duration, Instant};

use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::capability::detect_acceleration;
use crate::config::BootstrapConfig;
use crate::container::{ContainerReconciler, RunningContainer};
use crate::error::BootstrapError;
use crate::handoff::LaunchPlan;
use crate::models::{ensure_models, ModelReport};
use crate::output;
use crate::readiness::{HttpProbe, ReadinessPoller};
use crate::runtime::{short_id, ContainerRuntime};

/// Summary of a successful provisioning run
#[derive(Debug, Clone)]
pub struct BootstrapReport {
    pub run_id: String,
    pub container: RunningContainer,
    /// Probe attempt on which the service answered
    pub ready_after: u32,
    /// First model pass (may fetch)
    pub provisioned: ModelReport,
    /// Second model pass (fetches nothing when the first succeeded)
    pub verified: ModelReport,
    pub elapsed: Duration,
}

/// Drives one bootstrap against a container runtime
pub struct Bootstrapper<'a, R: ContainerRuntime + ?Sized> {
    runtime: &'a R,
    config: &'a BootstrapConfig,
    gpu_present: bool,
    run_id: String,
}

impl<'a, R: ContainerRuntime + ?Sized> Bootstrapper<'a, R> {
    /// Create a bootstrapper
    ///
    /// # Arguments
    /// * `runtime` - Container runtime used for every container operation
    /// * `config` - What to run and where
    /// * `gpu_present` - Result of the host GPU probe
    pub fn new(runtime: &'a R, config: &'a BootstrapConfig, gpu_present: bool) -> Self {
        Self {
            runtime,
            config,
            gpu_present,
            run_id: Uuid::now_v7().to_string(),
        }
    }

    /// Run ID attached to logs and passed downstream
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Provision the service, then build and check the downstream launch
    pub async fn run<I, S>(
        &self,
        passthrough: I,
        current_library_path: Option<&OsStr>,
    ) -> Result<(BootstrapReport, LaunchPlan), BootstrapError>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let probe = HttpProbe::new(self.config.readiness_endpoint());
        let report = self.provision(|| probe.probe()).await?;
        let plan = self.launch_plan(passthrough, current_library_path)?;
        Ok((report, plan))
    }

    /// Bring the container and its models to the desired state
    ///
    /// `probe` is called once per readiness attempt.
    pub async fn provision<F, Fut>(&self, probe: F) -> Result<BootstrapReport, BootstrapError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = bool>,
    {
        let span = info_span!(
            "bootstrap",
            run_id = %self.run_id,
            container = %self.config.container.name,
            otel.name = "bootstrap"
        );

        async {
            let start = Instant::now();
            info!(run_id = %self.run_id, image = %self.config.container.image, "Starting bootstrap");

            if !self.runtime.is_installed() {
                return Err(BootstrapError::EnvironmentMissing(
                    self.config.container.runtime.clone(),
                ));
            }

            let accel = detect_acceleration(self.gpu_present, self.runtime);

            let container = info_span!("reconcile_container", otel.name = "reconcile_container")
                .in_scope(|| {
                    ContainerReconciler::new(self.runtime, &self.config.container).reconcile(accel)
                })?;

            let endpoint = self.config.readiness_endpoint();
            output::info(format!("Waiting for model server at {} ...", endpoint));
            let ready_after = ReadinessPoller::new(endpoint, &self.config.readiness)
                .wait_with(probe)
                .instrument(info_span!("wait_ready", otel.name = "wait_ready"))
                .await?;
            output::success("Model server is ready");

            let provisioned = ensure_models(self.runtime, &container, &self.config.models)?;
            let verified = ensure_models(self.runtime, &container, &self.config.models)?;

            let elapsed = start.elapsed();
            info!(
                run_id = %self.run_id,
                container_id = %short_id(&container.id),
                accel = %container.accel,
                action = ?container.action,
                fetched = provisioned.fetched.len(),
                elapsed_ms = elapsed.as_millis() as u64,
                "Bootstrap complete"
            );

            Ok(BootstrapReport {
                run_id: self.run_id.clone(),
                container,
                ready_after,
                provisioned,
                verified,
                elapsed,
            })
        }
        .instrument(span)
        .await
    }

    /// Build the downstream invocation and check it can be launched
    pub fn launch_plan<I, S>(
        &self,
        passthrough: I,
        current_library_path: Option<&OsStr>,
    ) -> Result<LaunchPlan, BootstrapError>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let plan = LaunchPlan::build(
            &self.config.launch,
            passthrough,
            current_library_path,
            &self.run_id,
        );
        plan.preflight()?;
        Ok(plan)
    }
}
