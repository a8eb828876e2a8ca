//! Error types for the godownload installer.
//!
//! This module defines semantic error variants for every pipeline stage.
//! Each stage failure is wrapped in a [`StageFailure`] so the binary can
//! print a stage-specific, localised diagnostic.

use crate::artefact::download::DownloadError;
use crate::artefact::extraction::ExtractionError;
use crate::pipeline::Stage;
use crate::request::RequestError;
use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that can occur during the installation process.
#[derive(Debug, Error)]
pub enum InstallerError {
    /// The installation request could not be constructed.
    #[error(transparent)]
    InvalidRequest(#[from] RequestError),

    /// The configuration file could not be read or parsed.
    #[error("invalid configuration file {path}: {reason}")]
    ConfigFile {
        /// Path of the offending configuration file.
        path: Utf8PathBuf,
        /// Description of the read or parse failure.
        reason: String,
    },

    /// Fetching the distribution archive failed.
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Unpacking the distribution archive failed.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// Replacing the installation directory failed.
    #[error("cannot move {from} to {to}: {reason}")]
    Relocation {
        /// Extracted tree that was being moved.
        from: Utf8PathBuf,
        /// Installation directory that was being replaced.
        to: Utf8PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// A working directory could not be created.
    #[error("cannot create directory {path}")]
    DirectoryProvision {
        /// Directory that could not be created.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The shell profile could not be read.
    #[error("cannot read profile {path}")]
    ProfileRead {
        /// Path of the shell profile.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The shell profile could not be written.
    #[error("cannot write profile {path}")]
    ProfileWrite {
        /// Path of the shell profile.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A `go env -w` invocation failed.
    #[error("go env -w {key} failed: {message}")]
    Configuration {
        /// The environment key being configured.
        key: String,
        /// Description of the failure, usually the tool's stderr.
        message: String,
    },

    /// Sourcing the profile to capture the environment failed.
    #[error("environment capture failed: {reason}")]
    Environment {
        /// Description of the failure.
        reason: String,
    },

    /// Writing or running the profile refresh script failed.
    #[error("refresh script {path} failed: {reason}")]
    RefreshScript {
        /// Path of the refresh script.
        path: Utf8PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// An I/O operation failed.
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    /// Test stub received an unexpected or mismatched command invocation.
    #[cfg(any(test, feature = "test-support"))]
    #[error("stub mismatch: {message}")]
    StubMismatch {
        /// Description of what was expected versus what was received.
        message: String,
    },
}

impl InstallerError {
    /// Whether the failure was caused by running out of file descriptors.
    ///
    /// The binary uses this to print a `ulimit` hint.
    #[must_use]
    pub fn is_descriptor_exhaustion(&self) -> bool {
        match self {
            Self::Extraction(err) => err.is_descriptor_exhaustion(),
            Self::Io(err) => is_emfile(err),
            _ => false,
        }
    }
}

/// Whether `err` is `EMFILE` ("too many open files").
pub(crate) fn is_emfile(err: &std::io::Error) -> bool {
    #[cfg(unix)]
    {
        err.raw_os_error() == Some(libc::EMFILE)
    }
    #[cfg(not(unix))]
    {
        let _ = err;
        false
    }
}

/// A fatal failure annotated with the pipeline stage it occurred in.
#[derive(Debug, Error)]
#[error("{stage} failed: {source}")]
pub struct StageFailure {
    /// The stage that failed.
    pub stage: Stage,
    /// The underlying error.
    #[source]
    pub source: InstallerError,
}

impl StageFailure {
    /// Attach `stage` to `source`.
    #[must_use]
    pub const fn new(stage: Stage, source: InstallerError) -> Self {
        Self { stage, source }
    }
}

/// Result type alias using [`InstallerError`].
pub type Result<T> = std::result::Result<T, InstallerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relocation_error_names_both_paths() {
        let err = InstallerError::Relocation {
            from: Utf8PathBuf::from("./go"),
            to: Utf8PathBuf::from("/usr/local/go"),
            reason: "permission denied".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("./go"));
        assert!(msg.contains("/usr/local/go"));
        assert!(msg.contains("permission denied"));
    }

    #[test]
    fn configuration_error_includes_key_and_message() {
        let err = InstallerError::Configuration {
            key: "GOPROXY".to_owned(),
            message: "exit status 1".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("GOPROXY"));
        assert!(msg.contains("exit status 1"));
    }

    #[test]
    fn profile_read_preserves_source() {
        let err = InstallerError::ProfileRead {
            path: Utf8PathBuf::from("/etc/profile"),
            source: std::io::Error::other("denied"),
        };
        assert!(err.to_string().contains("/etc/profile"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn stage_failure_names_the_stage() {
        let failure = StageFailure::new(Stage::Relocate, InstallerError::Relocation {
            from: Utf8PathBuf::from("./go"),
            to: Utf8PathBuf::from("/usr/local/go"),
            reason: "boom".to_owned(),
        });
        let msg = failure.to_string();
        assert!(msg.contains("relocate"));
        assert!(msg.contains("boom"));
    }

    #[cfg(unix)]
    #[test]
    fn detects_descriptor_exhaustion() {
        let err = InstallerError::Io(std::io::Error::from_raw_os_error(libc::EMFILE));
        assert!(err.is_descriptor_exhaustion());
        let other = InstallerError::Io(std::io::Error::other("nope"));
        assert!(!other.is_descriptor_exhaustion());
    }
}
