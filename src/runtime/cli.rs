//! `ContainerRuntime` backed by the docker-compatible CLI

use std::process::{Command, Stdio};

use tracing::debug;

use super::{ContainerInfo, ContainerRuntime, RunSpec, RuntimeError};

/// Runtime that shells out to a docker-compatible CLI binary
#[derive(Debug, Clone)]
pub struct CliRuntime {
    binary: String,
}

impl CliRuntime {
    /// Create a runtime for the given CLI (e.g., "docker")
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Run the CLI with `args`, returning trimmed stdout on exit status 0
    fn command<S: AsRef<str>>(&self, args: &[S]) -> Result<String, RuntimeError> {
        let line = self.render(args);
        debug!(command = %line, "Running container runtime command");

        let output = Command::new(&self.binary)
            .args(args.iter().map(|a| a.as_ref()))
            .stdin(Stdio::null())
            .output()
            .map_err(|e| RuntimeError::new(&line, e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            debug!(command = %line, status = ?output.status.code(), stderr = %stderr, "Command failed");
            return Err(RuntimeError::new(line, stderr));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Like `command`, but streams output to the terminal (long pulls)
    fn command_inherit<S: AsRef<str>>(&self, args: &[S]) -> Result<(), RuntimeError> {
        let line = self.render(args);
        debug!(command = %line, "Running container runtime command");

        let status = Command::new(&self.binary)
            .args(args.iter().map(|a| a.as_ref()))
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| RuntimeError::new(&line, e.to_string()))?;

        if !status.success() {
            let detail = match status.code() {
                Some(code) => format!("exit status {}", code),
                None => "terminated by signal".to_string(),
            };
            return Err(RuntimeError::new(line, detail));
        }
        Ok(())
    }

    fn render<S: AsRef<str>>(&self, args: &[S]) -> String {
        let mut line = self.binary.clone();
        for arg in args {
            line.push(' ');
            line.push_str(arg.as_ref());
        }
        line
    }
}

impl ContainerRuntime for CliRuntime {
    fn is_installed(&self) -> bool {
        which::which(&self.binary).is_ok()
    }

    fn supports_acceleration(&self) -> bool {
        match self.command(&["info", "--format", "{{json .Runtimes}}"]) {
            Ok(json) => runtimes_include_nvidia(&json),
            Err(e) => {
                debug!(error = %e, "Could not query runtime plugins");
                false
            }
        }
    }

    fn exists(&self, name: &str) -> Result<bool, RuntimeError> {
        let filter = format!("name=^/?{}$", name);
        let names = self.command(&["ps", "-a", "--filter", filter.as_str(), "--format", "{{.Names}}"])?;
        Ok(names.lines().map(str::trim).any(|n| n == name))
    }

    fn inspect(&self, name: &str) -> Result<ContainerInfo, RuntimeError> {
        let json = self.command(&["container", "inspect", name])?;
        parse_inspect(&json).map_err(|e| {
            RuntimeError::new(format!("{} container inspect {}", self.binary, name), e)
        })
    }

    fn pull(&self, image: &str) -> Result<(), RuntimeError> {
        self.command_inherit(&["pull", image])
    }

    fn image_id(&self, image: &str) -> Result<String, RuntimeError> {
        let id = self.command(&["image", "inspect", "--format", "{{.Id}}", image])?;
        if id.is_empty() {
            return Err(RuntimeError::new(
                format!("{} image inspect {}", self.binary, image),
                "empty image id",
            ));
        }
        Ok(id)
    }

    fn run(&self, spec: &RunSpec) -> Result<String, RuntimeError> {
        self.command(&spec.to_args())
    }

    fn start(&self, name: &str) -> Result<(), RuntimeError> {
        self.command(&["start", name]).map(|_| ())
    }

    fn stop(&self, name: &str) -> Result<(), RuntimeError> {
        self.command(&["stop", name]).map(|_| ())
    }

    fn remove(&self, name: &str) -> Result<(), RuntimeError> {
        self.command(&["rm", name]).map(|_| ())
    }

    fn exec(&self, name: &str, command: &[&str]) -> Result<String, RuntimeError> {
        let mut args = vec!["exec", name];
        args.extend_from_slice(command);
        self.command(&args)
    }

    fn exec_streaming(&self, name: &str, command: &[&str]) -> Result<(), RuntimeError> {
        let mut args = vec!["exec", name];
        args.extend_from_slice(command);
        self.command_inherit(&args)
    }
}

/// `inspect` prints a JSON array with one object per container
fn parse_inspect(json: &str) -> Result<ContainerInfo, String> {
    let mut containers: Vec<ContainerInfo> =
        serde_json::from_str(json).map_err(|e| format!("unexpected inspect output: {}", e))?;
    if containers.is_empty() {
        return Err("no such container".to_string());
    }
    Ok(containers.swap_remove(0))
}

/// `info --format '{{json .Runtimes}}'` prints an object keyed by runtime name
fn runtimes_include_nvidia(json: &str) -> bool {
    match serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(json) {
        Ok(runtimes) => runtimes.keys().any(|name| name.contains("nvidia")),
        Err(_) => false,
    }
}
