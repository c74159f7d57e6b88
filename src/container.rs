//! Managed container reconciliation
//!
//! Brings the single named container to "running on the latest image":
//!
//! ```text
//! Absent                    → pull (fatal on error) → run         → Running
//! Present, image stale      → stop → rm → run                      → Running
//! Present, stopped, current → start                                → Running
//! Present, running, current → (nothing)                            → Running
//! ```
//!
//! The drift check (pull + image inspect) is best-effort: if the latest image
//! identity cannot be determined the container is treated as current.
//! Nothing is rolled back on failure, so a failed recreation can leave no
//! container behind. Concurrent runs against the same name are unsupported.

use tracing::{debug, info, warn};

use crate::config::ContainerConfig;
use crate::error::{BootstrapError, ProvisionStage};
use crate::output;
use crate::runtime::{AccelMode, ContainerRuntime, RunSpec, RuntimeError};

/// What reconciliation had to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileAction {
    /// Container did not exist and was created
    Created,
    /// Container ran an outdated image and was replaced
    Recreated,
    /// Container existed but was stopped
    Started,
    /// Container was already running the latest image
    Unchanged,
}

/// The managed container after successful reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunningContainer {
    pub name: String,
    /// Container ID as reported by the runtime
    pub id: String,
    pub accel: AccelMode,
    pub action: ReconcileAction,
}

/// Reconciles the managed container against its desired image
pub struct ContainerReconciler<'a, R: ContainerRuntime + ?Sized> {
    runtime: &'a R,
    config: &'a ContainerConfig,
}

impl<'a, R: ContainerRuntime + ?Sized> ContainerReconciler<'a, R> {
    pub fn new(runtime: &'a R, config: &'a ContainerConfig) -> Self {
        Self { runtime, config }
    }

    /// Ensure the container exists, runs the latest image, and is started
    pub fn reconcile(&self, accel: AccelMode) -> Result<RunningContainer, BootstrapError> {
        let name = &self.config.name;

        let exists = self
            .runtime
            .exists(name)
            .map_err(|e| BootstrapError::Runtime(e.to_string()))?;

        if !exists {
            info!(container = %name, image = %self.config.image, accel = %accel, "Container absent, creating");
            output::info(format!("Pulling {} ...", self.config.image));
            self.runtime
                .pull(&self.config.image)
                .map_err(|e| provision(ProvisionStage::Pull, e))?;

            let id = self.create(accel)?;
            output::success(format!("Created container {} ({})", name, accel));
            return Ok(self.running(id, accel, ReconcileAction::Created));
        }

        let current = self
            .runtime
            .inspect(name)
            .map_err(|e| BootstrapError::Runtime(e.to_string()))?;

        if let Some(latest) = self.latest_image_id() {
            if latest != current.image {
                info!(
                    container = %name,
                    current = %current.image,
                    latest = %latest,
                    "Image drift detected, recreating container"
                );
                output::info(format!("Updating {} to the latest image ...", name));

                self.runtime
                    .stop(name)
                    .map_err(|e| provision(ProvisionStage::Replace, e))?;
                self.runtime
                    .remove(name)
                    .map_err(|e| provision(ProvisionStage::Replace, e))?;

                let id = self.create(accel)?;
                output::success(format!("Recreated container {} on the latest image", name));
                return Ok(self.running(id, accel, ReconcileAction::Recreated));
            }
        }

        if !current.is_running() {
            info!(container = %name, "Container stopped, starting");
            self.runtime
                .start(name)
                .map_err(|e| provision(ProvisionStage::Start, e))?;
            output::success(format!("Started container {}", name));
            return Ok(self.running(current.id, accel, ReconcileAction::Started));
        }

        debug!(container = %name, id = %current.short_id(), "Container up to date and running");
        Ok(self.running(current.id, accel, ReconcileAction::Unchanged))
    }

    /// Pull the image and read its identity, or None if either step fails
    fn latest_image_id(&self) -> Option<String> {
        let image = &self.config.image;
        let result = self
            .runtime
            .pull(image)
            .and_then(|_| self.runtime.image_id(image));

        match result {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(image = %image, error = %e, "Update check failed, keeping current container");
                None
            }
        }
    }

    fn create(&self, accel: AccelMode) -> Result<String, BootstrapError> {
        let spec = RunSpec {
            name: self.config.name.clone(),
            image: self.config.image.clone(),
            port: (self.config.port, self.config.port),
            volume: self.config.volume.clone(),
            accel_args: if accel.is_enabled() {
                self.config.accel_args.clone()
            } else {
                Vec::new()
            },
        };

        self.runtime
            .run(&spec)
            .map_err(|e| provision(ProvisionStage::Create, e))
    }

    fn running(&self, id: String, accel: AccelMode, action: ReconcileAction) -> RunningContainer {
        RunningContainer {
            name: self.config.name.clone(),
            id,
            accel,
            action,
        }
    }
}

fn provision(stage: ProvisionStage, e: RuntimeError) -> BootstrapError {
    BootstrapError::Provision {
        stage,
        detail: e.to_string(),
    }
}
