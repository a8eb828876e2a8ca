//! Environment propagation from the updated shell profile.
//!
//! A child process can never alter its parent shell's environment. The best
//! this installer can do is source the profile in a subshell, capture what
//! it exports, and optionally copy that into its own process so the tools it
//! launches afterwards see the new `PATH` and `GOPATH`. Users still have to
//! open a new shell (or `source` the profile) themselves.

use crate::command::{CommandExecutor, failure_message};
use crate::error::{InstallerError, Result};
use camino::Utf8Path;
use std::collections::BTreeMap;

/// Environment variables captured from a subshell, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvironmentSnapshot {
    /// Parse the output of `env`: one `KEY=VALUE` per line, split on the
    /// first `=`.
    ///
    /// Lines without `=`, and lines whose key is not a shell identifier, are
    /// ignored. Surrounding whitespace is trimmed from keys and values.
    ///
    /// # Examples
    ///
    /// ```
    /// use godownload_installer::environment::EnvironmentSnapshot;
    ///
    /// let snapshot = EnvironmentSnapshot::parse("A=1\nmalformed\nB=x=y\n");
    /// assert_eq!(snapshot.get("A"), Some("1"));
    /// assert_eq!(snapshot.get("B"), Some("x=y"));
    /// assert_eq!(snapshot.len(), 2);
    /// ```
    #[must_use]
    pub fn parse(dump: &str) -> Self {
        let vars = dump
            .lines()
            .filter_map(|line| line.split_once('='))
            .map(|(key, value)| (key.trim(), value.trim()))
            .filter(|(key, value)| is_identifier(key) && !value.contains('\0'))
            .map(|(key, value)| (key.to_owned(), value.to_owned()))
            .collect();
        Self { vars }
    }

    /// Look up a captured variable.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Number of captured variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Iterate over the captured variables in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Copy every captured variable into this process's environment.
    ///
    /// Must be called while no other thread reads or writes the
    /// environment; the installer is single-threaded.
    pub fn apply(&self) {
        for (key, value) in &self.vars {
            // SAFETY: the installer runs its pipeline on a single thread, and
            // keys and values were filtered so `set_var` cannot panic.
            unsafe { std::env::set_var(key, value) };
        }
        log::debug!(target: "environment", "applied {} variables", self.vars.len());
    }
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Script run by `bash -c`; the profile path arrives as `$1` so it is never
/// parsed as shell text.
pub const CAPTURE_SCRIPT: &str = r#"source "$1" && env"#;

/// `$0` for the capture subshell.
pub const CAPTURE_SHELL_NAME: &str = "godownload";

/// Source `profile` in a bash subshell and capture the resulting
/// environment.
///
/// # Errors
///
/// Returns [`InstallerError::Environment`] if bash cannot be started or
/// exits unsuccessfully.
pub fn capture_environment(
    executor: &dyn CommandExecutor,
    profile: &Utf8Path,
) -> Result<EnvironmentSnapshot> {
    let output = executor
        .run(
            "bash",
            &["-c", CAPTURE_SCRIPT, CAPTURE_SHELL_NAME, profile.as_str()],
            &[],
        )
        .map_err(|e| InstallerError::Environment {
            reason: e.to_string(),
        })?;
    if !output.status.success() {
        return Err(InstallerError::Environment {
            reason: failure_message(&output),
        });
    }
    Ok(EnvironmentSnapshot::parse(&String::from_utf8_lossy(
        &output.stdout,
    )))
}
