//! Handoff to the downstream executable
//!
//! The last step replaces this process with the downstream server via
//! exec(). Building the command is kept separate from running it, so the
//! command line and environment can be checked without losing the process.

use std::convert::Infallible;
use std::ffi::{OsStr, OsString};
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::Command;

use nix::unistd::{access, AccessFlags};
use tracing::info;

use crate::config::{LaunchConfig, LIBRARY_PATH_VAR};
use crate::error::{BootstrapError, LaunchFailure};

/// Environment variable carrying the bootstrap run ID downstream
pub const RUN_ID_VAR: &str = "NEUROLAUNCH_RUN_ID";

/// Fully resolved downstream invocation
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchPlan {
    pub program: PathBuf,
    /// `--config <file>` followed by the pass-through arguments
    pub args: Vec<OsString>,
    /// Variables set on top of the inherited environment
    pub env: Vec<(OsString, OsString)>,
}

impl LaunchPlan {
    /// Build the invocation for `config`
    ///
    /// Relative paths are resolved against the working directory, so a bare
    /// executable name is never looked up on PATH and preflight checks the
    /// same file exec runs.
    ///
    /// `current_library_path` is the inherited value of the library search
    /// variable; the bundle's library dir is prepended to it.
    pub fn build<I, S>(
        config: &LaunchConfig,
        passthrough: I,
        current_library_path: Option<&OsStr>,
        run_id: &str,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let mut args: Vec<OsString> = vec![
            OsString::from("--config"),
            absolute(&config.config_file).into_os_string(),
        ];
        args.extend(passthrough.into_iter().map(Into::into));

        let env = vec![
            (
                OsString::from(LIBRARY_PATH_VAR),
                prepend_path(&absolute(&config.library_dir), current_library_path),
            ),
            (OsString::from(RUN_ID_VAR), OsString::from(run_id)),
        ];

        Self {
            program: absolute(&config.executable),
            args,
            env,
        }
    }

    /// Value this plan assigns to `key`, if any
    pub fn env_value(&self, key: &str) -> Option<&OsStr> {
        self.env
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_os_str())
    }

    /// Check the executable can be launched
    pub fn preflight(&self) -> Result<(), LaunchFailure> {
        check_executable(&self.program)
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        for (key, value) in &self.env {
            command.env(key, value);
        }
        command
    }

    /// Replace the current process with the downstream executable
    ///
    /// Only returns if exec() fails.
    pub fn exec(&self) -> Result<Infallible, BootstrapError> {
        self.preflight()?;
        info!(program = %self.program.display(), args = ?self.args, "Handing off");
        let err = self.command().exec();
        Err(LaunchFailure::Exec(self.program.clone(), err).into())
    }
}

/// Resolve `path` against the working directory
///
/// Falls back to a "./"-prefixed path if the working directory is unreadable.
pub fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(path)
}

/// `dir` followed by the previous value, ':'-separated; empty values dropped
pub fn prepend_path(dir: &Path, current: Option<&OsStr>) -> OsString {
    let mut value = dir.as_os_str().to_os_string();
    if let Some(current) = current.filter(|c| !c.is_empty()) {
        value.push(":");
        value.push(current);
    }
    value
}

/// Distinguish a missing file from one we may not execute
pub fn check_executable(path: &Path) -> Result<(), LaunchFailure> {
    let metadata = match std::fs::metadata(path) {
        Ok(m) => m,
        Err(_) => return Err(LaunchFailure::Missing(path.to_path_buf())),
    };

    if !metadata.is_file() || access(path, AccessFlags::X_OK).is_err() {
        return Err(LaunchFailure::NotExecutable(path.to_path_buf()));
    }
    Ok(())
}
