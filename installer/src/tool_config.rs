//! Persistent `go env -w` configuration of the installed toolchain.
//!
//! Configuration is expressed as an ordered list of [`ConfigIntent`]s and
//! applied by [`apply_configuration`], which stops at the first failure.

use crate::command::{CommandExecutor, failure_message};
use crate::error::{InstallerError, Result};
use crate::request::{InstallRequest, RequestError};
use camino::Utf8Path;
use std::fmt;

/// Module proxies written to `GOPROXY` when none are configured.
pub const DEFAULT_MODULE_PROXIES: [&str; 3] =
    ["https://goproxy.cn", "https://goproxy.io", "direct"];

/// A `go env` key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    /// `GOPATH`
    ModuleRoot,
    /// `GO111MODULE`
    ModuleMode,
    /// `GOPROXY`
    ModuleProxy,
    /// Any other upper-case key, validated by [`ConfigKey::from_name`].
    Extra(String),
}

impl ConfigKey {
    /// Parse a key name, mapping the well-known names onto their variants.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::InvalidToolKey`] unless `name` matches
    /// `[A-Z][A-Z0-9_]*`.
    ///
    /// # Examples
    ///
    /// ```
    /// use godownload_installer::tool_config::ConfigKey;
    ///
    /// assert_eq!(ConfigKey::from_name("GOPROXY").expect("valid"), ConfigKey::ModuleProxy);
    /// assert!(ConfigKey::from_name("go-proxy").is_err());
    /// ```
    pub fn from_name(name: &str) -> std::result::Result<Self, RequestError> {
        let mut chars = name.chars();
        let valid = chars.next().is_some_and(|c| c.is_ascii_uppercase())
            && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');
        if !valid {
            return Err(RequestError::InvalidToolKey {
                value: name.to_owned(),
            });
        }
        Ok(match name {
            "GOPATH" => Self::ModuleRoot,
            "GO111MODULE" => Self::ModuleMode,
            "GOPROXY" => Self::ModuleProxy,
            other => Self::Extra(other.to_owned()),
        })
    }

    /// The environment variable name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::ModuleRoot => "GOPATH",
            Self::ModuleMode => "GO111MODULE",
            Self::ModuleProxy => "GOPROXY",
            Self::Extra(name) => name,
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One `go env -w KEY=VALUE` assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIntent {
    /// The key to write.
    pub key: ConfigKey,
    /// The value to write.
    pub value: String,
}

impl ConfigIntent {
    /// Pair `key` with `value`.
    #[must_use]
    pub fn new(key: ConfigKey, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }

    /// `KEY=VALUE`, as passed to `go env -w`.
    #[must_use]
    pub fn assignment(&self) -> String {
        format!("{}={}", self.key, self.value)
    }
}

/// The intents for `request`: GOPATH, module mode, the proxy list, then
/// `extras` in their given order.
///
/// # Examples
///
/// ```
/// use camino::Utf8PathBuf;
/// use godownload_installer::platform::{GoArch, GoOs};
/// use godownload_installer::request::InstallRequest;
/// use godownload_installer::tool_config::intents_for;
///
/// let request = InstallRequest::new(
///     "1.20".parse().expect("valid version"),
///     GoOs::Linux,
///     GoArch::Amd64,
///     Utf8PathBuf::from("/usr/local"),
/// )
/// .expect("valid request");
/// let intents = intents_for(&request, &["direct".to_owned()], &[]);
/// let assignments: Vec<_> = intents.iter().map(|i| i.assignment()).collect();
/// assert_eq!(assignments, [
///     "GOPATH=/usr/local/go/path",
///     "GO111MODULE=on",
///     "GOPROXY=direct",
/// ]);
/// ```
#[must_use]
pub fn intents_for(
    request: &InstallRequest,
    proxies: &[String],
    extras: &[ConfigIntent],
) -> Vec<ConfigIntent> {
    let mut intents = vec![
        ConfigIntent::new(ConfigKey::ModuleRoot, request.go_path().as_str()),
        ConfigIntent::new(ConfigKey::ModuleMode, "on"),
        ConfigIntent::new(ConfigKey::ModuleProxy, proxies.join(",")),
    ];
    intents.extend_from_slice(extras);
    intents
}

/// Run `{go_binary} env -w` for each intent with `GOROOT={goroot}`,
/// returning the number applied.
///
/// # Errors
///
/// Returns [`InstallerError::Configuration`] for the first intent whose
/// command cannot be started or exits unsuccessfully; later intents are not
/// attempted.
pub fn apply_configuration(
    executor: &dyn CommandExecutor,
    go_binary: &Utf8Path,
    goroot: &Utf8Path,
    intents: &[ConfigIntent],
) -> Result<usize> {
    let envs = [("GOROOT", goroot.as_str())];
    for intent in intents {
        let assignment = intent.assignment();
        let failure = |message| InstallerError::Configuration {
            key: intent.key.name().to_owned(),
            message,
        };
        let output = executor
            .run(go_binary.as_str(), &["env", "-w", &assignment], &envs)
            .map_err(|e| failure(e.to_string()))?;
        if !output.status.success() {
            return Err(failure(failure_message(&output)));
        }
        log::info!(target: "configure", "go env -w {assignment}");
    }
    Ok(intents.len())
}
