//! Error type shared by every bootstrap stage
//!
//! Each stage returns `Result<_, BootstrapError>` and the orchestrator stops at
//! the first failure. Only `main` turns an error into a diagnostic and an exit
//! status.

use std::path::PathBuf;

/// Which step of container provisioning failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionStage {
    /// Pulling the image before first creation
    Pull,
    /// `run` (create + start) of the managed container
    Create,
    /// Starting an existing, stopped container
    Start,
    /// Stopping or removing a stale container before recreation
    Replace,
}

impl std::fmt::Display for ProvisionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stage = match self {
            ProvisionStage::Pull => "image pull",
            ProvisionStage::Create => "container creation",
            ProvisionStage::Start => "container start",
            ProvisionStage::Replace => "container replacement",
        };
        f.write_str(stage)
    }
}

/// Why the downstream executable could not be launched
#[derive(Debug)]
pub enum LaunchFailure {
    /// Nothing exists at the configured path
    Missing(PathBuf),
    /// The file exists but the current user may not execute it
    NotExecutable(PathBuf),
    /// exec() itself returned
    Exec(PathBuf, std::io::Error),
}

/// Error type for bootstrap operations
#[derive(Debug)]
pub enum BootstrapError {
    /// A required host tool is not installed
    EnvironmentMissing(String),
    /// Image pull or container create/start failed on the mandatory path
    Provision { stage: ProvisionStage, detail: String },
    /// A required model could not be fetched
    Resource { model: String, detail: String },
    /// The service never answered its readiness endpoint
    ReadinessTimeout { endpoint: String, attempts: u32 },
    /// The downstream executable could not be launched
    Launch(LaunchFailure),
    /// An environment override could not be parsed
    Config(String),
    /// The container runtime could not be invoked at all
    Runtime(String),
}

impl BootstrapError {
    /// Remediation text shown under the diagnostic
    pub fn hint(&self) -> Option<String> {
        match self {
            BootstrapError::EnvironmentMissing(tool) => {
                Some(format!("Install {} and make sure it is on your PATH", tool))
            }
            BootstrapError::Provision { stage: ProvisionStage::Pull, .. } => {
                Some("Check your network connection and registry access".to_string())
            }
            BootstrapError::Provision { .. } => {
                Some("Inspect the container runtime logs; port or volume conflicts are the usual cause".to_string())
            }
            BootstrapError::Resource { model, .. } => {
                Some(format!("Try fetching the model manually: ollama pull {}", model))
            }
            BootstrapError::ReadinessTimeout { .. } => {
                Some("The model server did not come up; check the container logs".to_string())
            }
            BootstrapError::Launch(LaunchFailure::Missing(_)) => {
                Some("Reinstall the release bundle or set NEUROLAUNCH_TARGET".to_string())
            }
            BootstrapError::Launch(LaunchFailure::NotExecutable(path)) => {
                Some(format!("Run: chmod +x {}", path.display()))
            }
            BootstrapError::Launch(LaunchFailure::Exec(..)) => None,
            BootstrapError::Config(_) => {
                Some("Fix or unset the offending NEUROLAUNCH_* variable".to_string())
            }
            BootstrapError::Runtime(_) => None,
        }
    }

    /// Process exit status for this error
    pub fn exit_code(&self) -> i32 {
        1
    }
}

impl std::fmt::Display for BootstrapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BootstrapError::EnvironmentMissing(tool) => write!(f, "{} is not installed", tool),
            BootstrapError::Provision { stage, detail } => {
                write!(f, "{} failed: {}", stage, detail)
            }
            BootstrapError::Resource { model, detail } => {
                write!(f, "Failed to fetch model {}: {}", model, detail)
            }
            BootstrapError::ReadinessTimeout { endpoint, attempts } => write!(
                f,
                "Service at {} not ready after {} attempts",
                endpoint, attempts
            ),
            BootstrapError::Launch(LaunchFailure::Missing(path)) => {
                write!(f, "Executable not found: {}", path.display())
            }
            BootstrapError::Launch(LaunchFailure::NotExecutable(path)) => {
                write!(f, "File is not executable: {}", path.display())
            }
            BootstrapError::Launch(LaunchFailure::Exec(path, e)) => {
                write!(f, "Failed to launch {}: {}", path.display(), e)
            }
            BootstrapError::Config(msg) => write!(f, "Invalid configuration: {}", msg),
            BootstrapError::Runtime(msg) => write!(f, "Container runtime error: {}", msg),
        }
    }
}

impl std::error::Error for BootstrapError {}

impl From<LaunchFailure> for BootstrapError {
    fn from(e: LaunchFailure) -> Self {
        BootstrapError::Launch(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_executable_hint_names_path() {
        let err = BootstrapError::Launch(LaunchFailure::NotExecutable(PathBuf::from("/opt/app/server")));
        assert_eq!(err.to_string(), "File is not executable: /opt/app/server");
        assert_eq!(err.hint().unwrap(), "Run: chmod +x /opt/app/server");
    }

    #[test]
    fn test_every_error_exits_nonzero() {
        let errors = vec![
            BootstrapError::EnvironmentMissing("docker".to_string()),
            BootstrapError::Provision { stage: ProvisionStage::Pull, detail: "offline".to_string() },
            BootstrapError::ReadinessTimeout { endpoint: "http://x".to_string(), attempts: 15 },
            BootstrapError::Config("bad".to_string()),
        ];
        for err in errors {
            assert_eq!(err.exit_code(), 1);
        }
    }

    #[test]
    fn test_provision_message_names_stage() {
        let err = BootstrapError::Provision {
            stage: ProvisionStage::Create,
            detail: "port is already allocated".to_string(),
        };
        assert_eq!(err.to_string(), "container creation failed: port is already allocated");
    }
}
