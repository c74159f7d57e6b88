//! Bootstrap configuration
//!
//! Every value the bootstrapper acts on lives in `BootstrapConfig`, so tests
//! can substitute their own container name, models, or downstream binary.
//! `from_env` layers `NEUROLAUNCH_*` overrides on top of the defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::BootstrapError;

/// Models the service must hold before the downstream process starts
pub const DEFAULT_MODELS: &[&str] = &["llama3.2:3b", "nomic-embed-text"];

/// Library search variable extended for the downstream process
#[cfg(target_os = "macos")]
pub const LIBRARY_PATH_VAR: &str = "DYLD_LIBRARY_PATH";
#[cfg(not(target_os = "macos"))]
pub const LIBRARY_PATH_VAR: &str = "LD_LIBRARY_PATH";

/// Settings for the managed model-server container
#[derive(Debug, Clone)]
pub struct ContainerConfig {
    /// Container runtime CLI (e.g., "docker" or "podman")
    pub runtime: String,
    /// Fixed logical name of the managed container
    pub name: String,
    /// Image reference to run
    pub image: String,
    /// Port published on the host and inside the container
    pub port: u16,
    /// Named volume mount in runtime syntax ("volume:/path")
    pub volume: String,
    /// Flag passed to `run` when hardware acceleration is enabled
    pub accel_args: Vec<String>,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            runtime: "docker".to_string(),
            name: "ollama".to_string(),
            image: "ollama/ollama:latest".to_string(),
            port: 11434,
            volume: "ollama:/root/.ollama".to_string(),
            accel_args: vec!["--gpus".to_string(), "all".to_string()],
        }
    }
}

/// Readiness polling settings
#[derive(Debug, Clone)]
pub struct ReadinessConfig {
    /// Path probed on the published port
    pub path: String,
    /// Probes before giving up
    pub max_attempts: u32,
    /// Fixed sleep between failed probes
    pub interval: Duration,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            path: "/api/version".to_string(),
            max_attempts: 15,
            interval: Duration::from_secs(2),
        }
    }
}

/// Downstream executable settings
#[derive(Debug, Clone)]
pub struct LaunchConfig {
    /// Executable that replaces this process
    pub executable: PathBuf,
    /// Config file passed via `--config`
    pub config_file: PathBuf,
    /// Directory prepended to the library search path
    pub library_dir: PathBuf,
}

impl LaunchConfig {
    /// Layout of a release bundle rooted at `install_dir`
    pub fn in_dir(install_dir: &Path) -> Self {
        Self {
            executable: install_dir.join("neuro-server"),
            config_file: install_dir.join("config.toml"),
            library_dir: install_dir.join("lib"),
        }
    }
}

/// Top-level configuration for one bootstrap run
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    pub container: ContainerConfig,
    pub readiness: ReadinessConfig,
    /// Ordered list of model names, optionally tag-qualified ("name:tag")
    pub models: Vec<String>,
    pub launch: LaunchConfig,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            container: ContainerConfig::default(),
            readiness: ReadinessConfig::default(),
            models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
            launch: LaunchConfig::in_dir(Path::new(".")),
        }
    }
}

impl BootstrapConfig {
    /// Build the configuration from the process environment
    ///
    /// The install directory defaults to the directory holding the running
    /// executable, so the downstream binary and its config are found next to it.
    pub fn from_env() -> Result<Self, BootstrapError> {
        let install_dir = match std::env::var_os("NEUROLAUNCH_HOME") {
            Some(dir) => PathBuf::from(dir),
            None => std::env::current_exe()
                .ok()
                .and_then(|exe| exe.parent().map(Path::to_path_buf))
                .unwrap_or_else(|| PathBuf::from(".")),
        };
        Self::from_lookup(&install_dir, |key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn from_lookup<F>(install_dir: &Path, lookup: F) -> Result<Self, BootstrapError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self {
            launch: LaunchConfig::in_dir(install_dir),
            ..Self::default()
        };

        if let Some(runtime) = lookup("NEUROLAUNCH_RUNTIME") {
            config.container.runtime = runtime;
        }
        if let Some(name) = lookup("NEUROLAUNCH_CONTAINER") {
            config.container.name = name;
        }
        if let Some(image) = lookup("NEUROLAUNCH_IMAGE") {
            config.container.image = image;
        }
        if let Some(port) = lookup("NEUROLAUNCH_PORT") {
            config.container.port = parse_number("NEUROLAUNCH_PORT", &port)?;
        }
        if let Some(volume) = lookup("NEUROLAUNCH_VOLUME") {
            config.container.volume = volume;
        }
        if let Some(path) = lookup("NEUROLAUNCH_HEALTH_PATH") {
            config.readiness.path = if path.starts_with('/') { path } else { format!("/{}", path) };
        }
        if let Some(attempts) = lookup("NEUROLAUNCH_READY_ATTEMPTS") {
            let attempts: u32 = parse_number("NEUROLAUNCH_READY_ATTEMPTS", &attempts)?;
            if attempts == 0 {
                return Err(BootstrapError::Config(
                    "NEUROLAUNCH_READY_ATTEMPTS must be at least 1".to_string(),
                ));
            }
            config.readiness.max_attempts = attempts;
        }
        if let Some(secs) = lookup("NEUROLAUNCH_READY_INTERVAL_SECS") {
            let secs: u64 = parse_number("NEUROLAUNCH_READY_INTERVAL_SECS", &secs)?;
            config.readiness.interval = Duration::from_secs(secs);
        }
        if let Some(models) = lookup("NEUROLAUNCH_MODELS") {
            config.models = models
                .split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string)
                .collect();
        }
        // Relative targets are relative to the install dir, never PATH lookups
        if let Some(target) = lookup("NEUROLAUNCH_TARGET") {
            config.launch.executable = install_dir.join(target);
        }
        if let Some(target_config) = lookup("NEUROLAUNCH_TARGET_CONFIG") {
            config.launch.config_file = install_dir.join(target_config);
        }

        Ok(config)
    }

    /// Readiness URL on the published port
    pub fn readiness_endpoint(&self) -> String {
        format!("http://127.0.0.1:{}{}", self.container.port, self.readiness.path)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, BootstrapError> {
    value
        .trim()
        .parse()
        .map_err(|_| BootstrapError::Config(format!("{}={:?} is not a valid number", key, value)))
}
