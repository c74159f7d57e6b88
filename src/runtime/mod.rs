//! Container runtime abstraction
//!
//! The bootstrapper never talks to a container engine directly. Every
//! operation goes through the `ContainerRuntime` trait, one method per CLI
//! verb it needs:
//!
//! ```text
//! ps -a / inspect   → exists(), inspect()
//! pull / image inspect → pull(), image_id()
//! run / start / stop / rm → run(), start(), stop(), remove()
//! exec              → exec()  (model listing and fetching)
//! ```
//!
//! `CliRuntime` shells out to `docker` (or any CLI with the same verbs, such
//! as `podman`). Tests swap in a recording fake.

pub mod cli;

pub use cli::CliRuntime;

use serde::Deserialize;

/// Failure of a single runtime CLI invocation
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeError {
    /// The command line that failed, for diagnostics
    pub command: String,
    /// stderr, or the spawn error when the CLI could not be started
    pub detail: String,
}

impl RuntimeError {
    pub fn new(command: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            detail: detail.into(),
        }
    }
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.detail.is_empty() {
            write!(f, "`{}` failed", self.command)
        } else {
            write!(f, "`{}` failed: {}", self.command, self.detail)
        }
    }
}

impl std::error::Error for RuntimeError {}

/// Whether the container is created with hardware acceleration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccelMode {
    Enabled,
    Disabled,
}

impl AccelMode {
    pub fn is_enabled(self) -> bool {
        matches!(self, AccelMode::Enabled)
    }
}

impl std::fmt::Display for AccelMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccelMode::Enabled => f.write_str("gpu"),
            AccelMode::Disabled => f.write_str("cpu"),
        }
    }
}

/// State of an existing container, as reported by `inspect`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerInfo {
    /// Full container ID
    pub id: String,
    /// Image identity the container was created from (e.g., "sha256:...")
    pub image: String,
    pub state: ContainerState,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerState {
    pub running: bool,
}

impl ContainerInfo {
    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn short_id(&self) -> &str {
        short_id(&self.id)
    }
}

/// First 12 characters of an ID, as the runtime CLIs print it
pub fn short_id(id: &str) -> &str {
    let id = id.strip_prefix("sha256:").unwrap_or(id);
    id.get(..12).unwrap_or(id)
}

/// Parameters for creating the managed container
#[derive(Debug, Clone, PartialEq)]
pub struct RunSpec {
    pub name: String,
    pub image: String,
    /// (host, container) port pair
    pub port: (u16, u16),
    /// Named volume mount ("volume:/path")
    pub volume: String,
    /// Extra flags when acceleration is enabled (e.g., ["--gpus", "all"])
    pub accel_args: Vec<String>,
}

impl RunSpec {
    /// Arguments after the CLI binary, in `run -d ...` form
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "run".to_string(),
            "-d".to_string(),
            "--name".to_string(),
            self.name.clone(),
        ];
        args.extend(self.accel_args.iter().cloned());
        args.push("-p".to_string());
        args.push(format!("{}:{}", self.port.0, self.port.1));
        args.push("-v".to_string());
        args.push(self.volume.clone());
        args.push(self.image.clone());
        args
    }
}

/// Operations the bootstrapper needs from a container engine
///
/// All methods are blocking; they are called one at a time from the
/// orchestrator and always target the single managed container.
pub trait ContainerRuntime {
    /// Whether the runtime CLI is installed
    fn is_installed(&self) -> bool;

    /// Whether the runtime can hand GPUs to containers (e.g., nvidia runtime)
    fn supports_acceleration(&self) -> bool;

    /// Whether a container with exactly this name exists (running or not)
    fn exists(&self, name: &str) -> Result<bool, RuntimeError>;

    /// Inspect an existing container
    fn inspect(&self, name: &str) -> Result<ContainerInfo, RuntimeError>;

    /// Pull the latest version of an image
    fn pull(&self, image: &str) -> Result<(), RuntimeError>;

    /// Identity of the locally stored image (e.g., "sha256:...")
    fn image_id(&self, image: &str) -> Result<String, RuntimeError>;

    /// Create and start a container, returning its ID
    fn run(&self, spec: &RunSpec) -> Result<String, RuntimeError>;

    fn start(&self, name: &str) -> Result<(), RuntimeError>;

    fn stop(&self, name: &str) -> Result<(), RuntimeError>;

    fn remove(&self, name: &str) -> Result<(), RuntimeError>;

    /// Run a command inside the container and return its stdout
    ///
    /// A non-zero exit status is an error.
    fn exec(&self, name: &str, command: &[&str]) -> Result<String, RuntimeError>;

    /// Like `exec`, but the command's output goes to our stdout/stderr
    ///
    /// Used for long-running commands whose progress the operator should see.
    fn exec_streaming(&self, name: &str, command: &[&str]) -> Result<(), RuntimeError>;
}
