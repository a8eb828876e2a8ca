//! Installer configuration file and settings resolution.
//!
//! The optional `config.toml` supplies defaults for anything the command line
//! can set. [`resolve`] merges the two with command-line values taking
//! precedence over the file, and the file over built-in defaults.

use crate::cli::Cli;
use crate::dirs::BaseDirs;
use crate::error::{InstallerError, Result};
use crate::pipeline::PipelineSettings;
use crate::platform::{GoArch, GoOs};
use crate::request::{DistributionVersion, InstallRequest, RequestError};
use crate::tool_config::{ConfigIntent, ConfigKey};
use camino::{Utf8Path, Utf8PathBuf};
use godownload_common::normalise_locale;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Go version installed when neither flag nor file names one.
pub const DEFAULT_GO_VERSION: &str = "1.20";

/// Install root used when neither flag nor file names one.
pub const DEFAULT_INSTALL_ROOT: &str = "/usr/local";

/// Settings read from `config.toml`.
///
/// Every key is optional. Unknown keys are rejected so typos surface early.
///
/// # Examples
///
/// ```
/// use godownload_installer::config::InstallerConfig;
///
/// let config: InstallerConfig = toml::from_str(r#"
///     version = "1.21.5"
///     module_proxies = ["https://proxy.golang.org", "direct"]
///
///     [tool_env]
///     GOSUMDB = "off"
/// "#).expect("valid configuration");
/// assert_eq!(config.version.as_deref(), Some("1.21.5"));
/// ```
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct InstallerConfig {
    /// Go version to install.
    pub version: Option<String>,
    /// Base directory receiving the `go` tree.
    pub install_root: Option<Utf8PathBuf>,
    /// Mirror serving the distribution archives.
    pub download_base_url: Option<String>,
    /// Shell profile receiving the exports.
    pub profile_path: Option<Utf8PathBuf>,
    /// Directory for the archive and the extracted tree.
    pub work_dir: Option<Utf8PathBuf>,
    /// Where the refresh script is written.
    pub refresh_script_path: Option<Utf8PathBuf>,
    /// `GOPROXY` entries.
    pub module_proxies: Option<Vec<String>>,
    /// Download timeout in seconds; `0` disables it.
    pub download_timeout_secs: Option<u64>,
    /// Preferred message locale.
    pub locale: Option<String>,
    /// Copy the profile's environment into the installer process.
    pub apply_environment: Option<bool>,
    /// Run `go env -w` after installing.
    pub configure_tool: Option<bool>,
    /// Extra `go env -w` assignments.
    pub tool_env: BTreeMap<String, String>,
}

impl InstallerConfig {
    /// Parse a configuration document read from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::ConfigFile`] when the document is not valid
    /// TOML or contains unknown keys.
    pub fn parse(source: &str, path: &Utf8Path) -> Result<Self> {
        toml::from_str(source).map_err(|err| InstallerError::ConfigFile {
            path: path.to_owned(),
            reason: err.message().to_owned(),
        })
    }

    /// Load the configuration.
    ///
    /// An `explicit` path must exist. Without one, the per-user file from
    /// `dirs` is read when present and an empty configuration is returned
    /// otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::ConfigFile`] when the file cannot be read or
    /// parsed.
    pub fn load(explicit: Option<&Utf8Path>, dirs: &dyn BaseDirs) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::read(path);
        }
        match dirs.config_file() {
            Some(path) if path.is_file() => Self::read(&path),
            Some(path) => {
                log::debug!(target: "config", "no configuration at {path}");
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    fn read(path: &Utf8Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|err| InstallerError::ConfigFile {
            path: path.to_owned(),
            reason: err.to_string(),
        })?;
        log::debug!(target: "config", "loaded configuration from {path}");
        Self::parse(&source, path)
    }

    /// The configured locale with surrounding whitespace removed.
    #[must_use]
    pub fn locale(&self) -> Option<&str> {
        normalise_locale(self.locale.as_deref())
    }

    /// Extra `go env -w` assignments, validated and in key order.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::InvalidRequest`] when a key is not an
    /// upper-case environment name or is one of the keys the installer sets
    /// itself (`GOPATH`, `GO111MODULE`, `GOPROXY`).
    pub fn tool_env_intents(&self) -> Result<Vec<ConfigIntent>> {
        self.tool_env
            .iter()
            .map(|(key, value)| -> Result<ConfigIntent> {
                match ConfigKey::from_name(key)? {
                    extra @ ConfigKey::Extra(_) => Ok(ConfigIntent::new(extra, value.clone())),
                    _ => Err(RequestError::ReservedToolKey { value: key.clone() }.into()),
                }
            })
            .collect()
    }
}

/// Everything the binary needs to run the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRun {
    /// What to install and where.
    pub request: InstallRequest,
    /// Paths, mirror, and stage switches.
    pub settings: PipelineSettings,
    /// Download timeout; `None` waits indefinitely.
    pub download_timeout: Option<Duration>,
}

/// Merge command-line flags over the configuration file and defaults.
///
/// # Errors
///
/// Returns [`InstallerError::InvalidRequest`] when the version, platform,
/// install root, or a tool configuration key is invalid.
pub fn resolve(cli: &Cli, config: &InstallerConfig) -> Result<ResolvedRun> {
    let version: DistributionVersion = cli
        .go_version
        .as_deref()
        .or(config.version.as_deref())
        .unwrap_or(DEFAULT_GO_VERSION)
        .parse()?;
    let os = cli.os.as_deref().map_or_else(GoOs::host, str::parse)?;
    let arch = cli.arch.as_deref().map_or_else(GoArch::host, str::parse)?;
    let install_root = cli
        .root
        .clone()
        .or_else(|| config.install_root.clone())
        .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_INSTALL_ROOT));
    let request = InstallRequest::new(version, os, arch, install_root)?;

    let defaults = PipelineSettings::default();
    let settings = PipelineSettings {
        download_base_url: cli
            .mirror
            .clone()
            .or_else(|| config.download_base_url.clone())
            .unwrap_or(defaults.download_base_url),
        work_dir: cli
            .work_dir
            .clone()
            .or_else(|| config.work_dir.clone())
            .unwrap_or(defaults.work_dir),
        profile_path: cli
            .profile
            .clone()
            .or_else(|| config.profile_path.clone())
            .unwrap_or(defaults.profile_path),
        refresh_script_path: config
            .refresh_script_path
            .clone()
            .unwrap_or(defaults.refresh_script_path),
        module_proxies: config
            .module_proxies
            .clone()
            .unwrap_or(defaults.module_proxies),
        extra_tool_env: config.tool_env_intents()?,
        apply_environment: !cli.no_apply_env && config.apply_environment.unwrap_or(true),
        configure_tool: !cli.skip_tool_config && config.configure_tool.unwrap_or(true),
    };

    let download_timeout = cli
        .timeout
        .or(config.download_timeout_secs)
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs);

    Ok(ResolvedRun {
        request,
        settings,
        download_timeout,
    })
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
