//! Hardware acceleration detection
//!
//! Acceleration is used only when the host has a GPU *and* the container
//! runtime can pass it through. A GPU without runtime support degrades to
//! CPU mode with a warning.

use std::process::{Command, Stdio};

use tracing::{debug, warn};

use crate::output;
use crate::runtime::{AccelMode, ContainerRuntime};

/// Host tool whose successful exit means a usable GPU is present
const GPU_PROBE: &str = "nvidia-smi";

/// Combine the two probe results into an acceleration mode
///
/// Returns the mode and whether the partial-capability warning applies.
pub fn resolve_acceleration(gpu_present: bool, runtime_supported: bool) -> (AccelMode, bool) {
    match (gpu_present, runtime_supported) {
        (true, true) => (AccelMode::Enabled, false),
        (true, false) => (AccelMode::Disabled, true),
        (false, _) => (AccelMode::Disabled, false),
    }
}

/// Probe the host for a GPU
pub fn gpu_present() -> bool {
    if which::which(GPU_PROBE).is_err() {
        debug!(probe = GPU_PROBE, "GPU probe not installed");
        return false;
    }

    Command::new(GPU_PROBE)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Decide whether the managed container gets hardware acceleration
///
/// The runtime is only queried when a GPU is present.
pub fn detect_acceleration<R: ContainerRuntime + ?Sized>(has_gpu: bool, runtime: &R) -> AccelMode {
    let runtime_supported = has_gpu && runtime.supports_acceleration();
    let (mode, partial) = resolve_acceleration(has_gpu, runtime_supported);

    if partial {
        warn!("GPU detected but the container runtime has no GPU support; running on CPU");
        output::warning(
            "GPU detected, but the container runtime cannot use it (install the NVIDIA Container Toolkit). Falling back to CPU.",
        );
    }
    debug!(mode = %mode, "Acceleration resolved");
    mode
}
