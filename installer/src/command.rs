//! Subprocess execution seam.
//!
//! Every external command the installer runs (the profile-sourcing subshell,
//! `go env -w`, and the refresh script) goes through [`CommandExecutor`] so
//! tests can substitute scripted responses.

use crate::error::{InstallerError, Result};
use std::process::{Command, Output};

/// Abstraction for running external commands.
pub trait CommandExecutor {
    /// Runs `cmd` with `args`, adding `envs` to the inherited environment,
    /// and returns the captured output.
    ///
    /// # Errors
    ///
    /// Returns any I/O errors encountered while spawning or running the command.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use godownload_installer::command::{CommandExecutor, SystemCommandExecutor};
    ///
    /// let executor = SystemCommandExecutor;
    /// let output = executor.run("go", &["version"], &[("GOROOT", "/usr/local/go")])?;
    /// assert!(output.status.success());
    /// # Ok::<(), godownload_installer::error::InstallerError>(())
    /// ```
    fn run(&self, cmd: &str, args: &[&str], envs: &[(&str, &str)]) -> Result<Output>;
}

/// Executes commands on the host system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandExecutor;

impl CommandExecutor for SystemCommandExecutor {
    fn run(&self, cmd: &str, args: &[&str], envs: &[(&str, &str)]) -> Result<Output> {
        log::debug!(target: "command", "running {cmd} {}", args.join(" "));
        Command::new(cmd)
            .args(args)
            .envs(envs.iter().copied())
            .output()
            .map_err(InstallerError::from)
    }
}

/// Render a failed command's stderr, or its exit status when stderr is empty.
pub(crate) fn failure_message(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        output.status.to_string()
    } else {
        trimmed.to_owned()
    }
}
