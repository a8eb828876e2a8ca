//! The immutable installation request and the paths derived from it.
//!
//! Every stage of the pipeline receives the same [`InstallRequest`] by
//! reference; nothing is read from global state.

use crate::platform::{GoArch, GoOs};
use camino::{Utf8Path, Utf8PathBuf};
use std::fmt;
use thiserror::Error;

/// Name of the top-level directory inside every Go distribution archive.
pub const DISTRIBUTION_DIR: &str = "go";

/// Errors arising from invalid request values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// The version string is empty or contains characters that would escape
    /// the archive name.
    #[error("invalid Go version \"{value}\": {reason}")]
    InvalidVersion {
        /// The rejected version string.
        value: String,
        /// Description of the validation failure.
        reason: &'static str,
    },

    /// The operating system has no Go distribution.
    #[error("unsupported operating system \"{value}\"; expected one of: {expected}")]
    UnsupportedOs {
        /// The rejected name.
        value: String,
        /// Comma-separated list of accepted names.
        expected: String,
    },

    /// The architecture has no Go distribution.
    #[error("unsupported architecture \"{value}\"; expected one of: {expected}")]
    UnsupportedArch {
        /// The rejected name.
        value: String,
        /// Comma-separated list of accepted names.
        expected: String,
    },

    /// The install root is empty.
    #[error("install root must not be empty")]
    EmptyInstallRoot,

    /// A tool configuration key is not an upper-case environment name.
    #[error("invalid tool configuration key \"{value}\"; expected [A-Z][A-Z0-9_]*")]
    InvalidToolKey {
        /// The rejected key.
        value: String,
    },

    /// A tool configuration key the installer always sets itself.
    #[error("tool configuration key \"{value}\" is set by the installer and cannot be overridden")]
    ReservedToolKey {
        /// The rejected key.
        value: String,
    },
}

/// A validated Go distribution version such as `1.20` or `1.22rc1`.
///
/// # Examples
///
/// ```
/// use godownload_installer::request::DistributionVersion;
///
/// let version: DistributionVersion = "1.21.5".parse().expect("valid version");
/// assert_eq!(version.as_str(), "1.21.5");
/// assert!("../1.20".parse::<DistributionVersion>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DistributionVersion(String);

impl DistributionVersion {
    /// Return the version as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for DistributionVersion {
    type Err = RequestError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = |reason| RequestError::InvalidVersion {
            value: value.to_owned(),
            reason,
        };

        if !value.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(invalid("must start with a digit"));
        }
        if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '.') {
            return Err(invalid("only ASCII letters, digits, and '.' are allowed"));
        }
        if value.contains("..") {
            return Err(invalid("must not contain '..'"));
        }
        Ok(Self(value.to_owned()))
    }
}

impl fmt::Display for DistributionVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What to install and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRequest {
    version: DistributionVersion,
    os: GoOs,
    arch: GoArch,
    install_root: Utf8PathBuf,
}

impl InstallRequest {
    /// Construct a request.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::EmptyInstallRoot`] when `install_root` is
    /// empty.
    pub fn new(
        version: DistributionVersion,
        os: GoOs,
        arch: GoArch,
        install_root: Utf8PathBuf,
    ) -> Result<Self, RequestError> {
        if install_root.as_str().is_empty() {
            return Err(RequestError::EmptyInstallRoot);
        }
        Ok(Self {
            version,
            os,
            arch,
            install_root,
        })
    }

    /// The requested distribution version.
    #[must_use]
    pub fn version(&self) -> &DistributionVersion {
        &self.version
    }

    /// The target operating system.
    #[must_use]
    pub const fn os(&self) -> GoOs {
        self.os
    }

    /// The target architecture.
    #[must_use]
    pub const fn arch(&self) -> GoArch {
        self.arch
    }

    /// Base directory everything is installed under.
    #[must_use]
    pub fn install_root(&self) -> &Utf8Path {
        &self.install_root
    }

    /// `{root}/go`: the installation directory, also used as `GOROOT`.
    #[must_use]
    pub fn install_dir(&self) -> Utf8PathBuf {
        self.install_root.join(DISTRIBUTION_DIR)
    }

    /// `{root}/go/bin`
    #[must_use]
    pub fn bin_dir(&self) -> Utf8PathBuf {
        self.install_dir().join("bin")
    }

    /// `{root}/go/path`: the `GOPATH` workspace and the profile marker.
    #[must_use]
    pub fn go_path(&self) -> Utf8PathBuf {
        self.install_dir().join("path")
    }

    /// `{root}/go/path/pkg/mod`
    #[must_use]
    pub fn module_cache_dir(&self) -> Utf8PathBuf {
        self.go_path().join("pkg").join("mod")
    }

    /// Path of the installed `go` binary.
    #[must_use]
    pub fn go_binary(&self) -> Utf8PathBuf {
        let name = if self.os == GoOs::Windows { "go.exe" } else { "go" };
        self.bin_dir().join(name)
    }

    /// `go{version}.{os}-{arch}.tar.gz`
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8PathBuf;
    /// use godownload_installer::platform::{GoArch, GoOs};
    /// use godownload_installer::request::InstallRequest;
    ///
    /// let request = InstallRequest::new(
    ///     "1.20".parse().expect("valid version"),
    ///     GoOs::Linux,
    ///     GoArch::Amd64,
    ///     Utf8PathBuf::from("/usr/local"),
    /// )
    /// .expect("valid request");
    /// assert_eq!(request.archive_name(), "go1.20.linux-amd64.tar.gz");
    /// ```
    #[must_use]
    pub fn archive_name(&self) -> String {
        format!("go{}.{}-{}.tar.gz", self.version, self.os, self.arch)
    }

    /// The auxiliary directories the provisioning stage creates.
    #[must_use]
    pub fn working_dirs(&self) -> Vec<Utf8PathBuf> {
        let go_path = self.go_path();
        vec![go_path.join("bin"), self.module_cache_dir(), go_path]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn request() -> InstallRequest {
        InstallRequest::new(
            "1.20".parse().expect("valid version"),
            GoOs::Linux,
            GoArch::Amd64,
            Utf8PathBuf::from("/usr/local"),
        )
        .expect("valid request")
    }

    #[rstest]
    fn derives_installation_paths(request: InstallRequest) {
        assert_eq!(request.install_dir(), Utf8PathBuf::from("/usr/local/go"));
        assert_eq!(request.bin_dir(), Utf8PathBuf::from("/usr/local/go/bin"));
        assert_eq!(request.go_path(), Utf8PathBuf::from("/usr/local/go/path"));
        assert_eq!(
            request.module_cache_dir(),
            Utf8PathBuf::from("/usr/local/go/path/pkg/mod")
        );
        assert_eq!(
            request.go_binary(),
            Utf8PathBuf::from("/usr/local/go/bin/go")
        );
    }

    #[rstest]
    fn every_derived_path_is_under_the_install_root(request: InstallRequest) {
        let root = request.install_root().to_owned();
        let mut derived = vec![
            request.install_dir(),
            request.bin_dir(),
            request.go_path(),
            request.module_cache_dir(),
            request.go_binary(),
        ];
        derived.extend(request.working_dirs());
        for path in derived {
            assert!(path.starts_with(&root), "{path} escapes {root}");
            assert_ne!(path, root);
        }
    }

    #[rstest]
    fn archive_name_follows_distribution_naming(request: InstallRequest) {
        assert_eq!(request.archive_name(), "go1.20.linux-amd64.tar.gz");
    }

    #[test]
    fn windows_binary_has_exe_suffix() {
        let request = InstallRequest::new(
            "1.21.5".parse().expect("valid version"),
            GoOs::Windows,
            GoArch::Amd64,
            Utf8PathBuf::from("C:/tools"),
        )
        .expect("valid request");
        assert!(request.go_binary().as_str().ends_with("go.exe"));
    }

    #[rstest]
    #[case::plain("1.20")]
    #[case::patch("1.21.5")]
    #[case::release_candidate("1.22rc1")]
    fn accepts_distribution_versions(#[case] raw: &str) {
        let version: DistributionVersion = raw.parse().expect("valid version");
        assert_eq!(version.as_str(), raw);
    }

    #[rstest]
    #[case::empty("")]
    #[case::leading_letter("v1.20")]
    #[case::slash("1.20/../../etc")]
    #[case::dots("1..20")]
    #[case::space("1.20 ")]
    fn rejects_malformed_versions(#[case] raw: &str) {
        let err = raw
            .parse::<DistributionVersion>()
            .expect_err("version should be rejected");
        assert!(matches!(err, RequestError::InvalidVersion { .. }));
    }

    #[test]
    fn rejects_empty_install_root() {
        let err = InstallRequest::new(
            "1.20".parse().expect("valid version"),
            GoOs::Linux,
            GoArch::Amd64,
            Utf8PathBuf::new(),
        )
        .expect_err("empty root should be rejected");
        assert_eq!(err, RequestError::EmptyInstallRoot);
    }
}
