//! Distribution archive extraction.
//!
//! Unpacks `.tar.gz` archives entry by entry, keeping only entries under a
//! name prefix (`go/` for Go distributions), with path traversal protection
//! and file mode preservation.

use camino::{Utf8Path, Utf8PathBuf};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Component, Path, PathBuf};
use tar::EntryType;

/// Prefix of the entries a Go distribution archive installs.
pub const DISTRIBUTION_PREFIX: &str = "go/";

/// Counts reported by a successful extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    /// Directories and regular files written to disk.
    pub materialized: usize,
    /// Entries ignored because they were outside the prefix or were not a
    /// directory or regular file.
    pub skipped: usize,
}

/// Trait for extracting distribution archives, enabling test mocking.
///
/// # Examples
///
/// ```
/// use godownload_installer::artefact::extraction::GzipExtractor;
///
/// let extractor = GzipExtractor::default();
/// assert_eq!(extractor.prefix(), "go/");
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait ArchiveExtractor {
    /// Extract the prefixed entries of `archive` beneath `dest_root`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::Open`] if the archive cannot be opened,
    /// [`ExtractionError::Corrupt`] if it cannot be decompressed or read,
    /// [`ExtractionError::PathTraversal`] if an entry escapes `dest_root`,
    /// [`ExtractionError::Write`] if an entry cannot be materialised, and
    /// [`ExtractionError::NoMatchingEntries`] if nothing matched the prefix.
    fn extract(
        &self,
        archive: &Utf8Path,
        dest_root: &Utf8Path,
    ) -> Result<ExtractionReport, ExtractionError>;
}

/// Errors arising from archive extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// The archive file could not be opened.
    #[error("cannot open archive {path}")]
    Open {
        /// The archive path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The archive could not be decompressed or its tar stream is damaged.
    #[error("archive {path} is corrupt or truncated")]
    Corrupt {
        /// The archive path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// An entry could not be written to disk.
    #[error("cannot write {}", .path.display())]
    Write {
        /// Destination of the entry.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A path in the archive attempts to traverse outside the destination.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The offending path from the archive entry.
        path: String,
    },

    /// No entry carried the expected prefix.
    #[error("archive contains no entries under {prefix}")]
    NoMatchingEntries {
        /// The prefix that was searched for.
        prefix: String,
    },
}

impl ExtractionError {
    /// Whether the failure was caused by running out of file descriptors.
    #[must_use]
    pub fn is_descriptor_exhaustion(&self) -> bool {
        match self {
            Self::Open { source, .. } | Self::Write { source, .. } => {
                crate::error::is_emfile(source)
            }
            _ => false,
        }
    }
}

/// Extractor for gzip-compressed tarballs using `flate2` and `tar`.
///
/// Each regular file handle is closed before the next entry is read, so
/// large distributions never hold more than one output file open.
#[derive(Debug, Clone)]
pub struct GzipExtractor {
    prefix: String,
}

impl GzipExtractor {
    /// Create an extractor keeping only entries whose raw name starts with
    /// `prefix`.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// The entry name prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl Default for GzipExtractor {
    fn default() -> Self {
        Self::new(DISTRIBUTION_PREFIX)
    }
}

impl ArchiveExtractor for GzipExtractor {
    fn extract(
        &self,
        archive: &Utf8Path,
        dest_root: &Utf8Path,
    ) -> Result<ExtractionReport, ExtractionError> {
        let corrupt = |source| ExtractionError::Corrupt {
            path: archive.to_owned(),
            source,
        };

        let file = File::open(archive).map_err(|source| ExtractionError::Open {
            path: archive.to_owned(),
            source,
        })?;
        let mut tarball = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
        let mut report = ExtractionReport::default();

        for entry_result in tarball.entries().map_err(corrupt)? {
            let mut entry = entry_result.map_err(corrupt)?;
            if !entry.path_bytes().starts_with(self.prefix.as_bytes()) {
                report.skipped += 1;
                continue;
            }

            let entry_path = entry.path().map_err(corrupt)?.into_owned();
            validate_entry_path(&entry_path)?;
            let target = dest_root.as_std_path().join(&entry_path);
            match entry.header().entry_type() {
                EntryType::Directory => {
                    let mode = entry.header().mode().map_err(corrupt)?;
                    std::fs::create_dir_all(&target)
                        .map_err(|source| write_error(&target, source))?;
                    apply_mode(&target, mode)?;
                }
                EntryType::Regular | EntryType::Continuous => {
                    let mode = entry.header().mode().map_err(corrupt)?;
                    materialize_file(&mut entry, &target, mode, archive)?;
                }
                other => {
                    log::debug!(
                        target: "extract",
                        "skipping {other:?} entry {}",
                        entry_path.display()
                    );
                    report.skipped += 1;
                    continue;
                }
            }
            report.materialized += 1;
        }

        if report.materialized == 0 {
            return Err(ExtractionError::NoMatchingEntries {
                prefix: self.prefix.clone(),
            });
        }
        log::debug!(
            target: "extract",
            "materialised {} entries, skipped {}",
            report.materialized,
            report.skipped
        );
        Ok(report)
    }
}

/// Write one regular file entry. The output handle is dropped on return.
fn materialize_file(
    entry: &mut impl Read,
    target: &Path,
    mode: u32,
    archive: &Utf8Path,
) -> Result<(), ExtractionError> {
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent).map_err(|source| write_error(parent, source))?;
    }
    let mut output = File::create(target).map_err(|source| write_error(target, source))?;
    io::copy(entry, &mut output).map_err(|source| match source.kind() {
        io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => ExtractionError::Corrupt {
            path: archive.to_owned(),
            source,
        },
        _ => write_error(target, source),
    })?;
    drop(output);
    apply_mode(target, mode)
}

#[cfg(unix)]
fn apply_mode(path: &Path, mode: u32) -> Result<(), ExtractionError> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode & 0o7777))
        .map_err(|source| write_error(path, source))
}

#[cfg(not(unix))]
fn apply_mode(_path: &Path, _mode: u32) -> Result<(), ExtractionError> {
    Ok(())
}

fn write_error(path: &Path, source: io::Error) -> ExtractionError {
    ExtractionError::Write {
        path: path.to_path_buf(),
        source,
    }
}

/// Validate that a tar entry path does not escape the destination
/// directory via `..` components or absolute paths.
fn validate_entry_path(path: &Path) -> Result<(), ExtractionError> {
    if path.is_absolute() {
        return Err(ExtractionError::PathTraversal {
            path: path.display().to_string(),
        });
    }
    if path
        .components()
        .any(|component| matches!(component, Component::ParentDir))
    {
        return Err(ExtractionError::PathTraversal {
            path: path.display().to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "extraction_tests.rs"]
mod tests;
