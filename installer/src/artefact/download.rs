//! Distribution archive download.
//!
//! Provides a trait-based abstraction for fetching the Go archive so the
//! pipeline can be exercised against stubs, plus the `ureq`-backed
//! production implementation.

use camino::{Utf8Path, Utf8PathBuf};
use std::time::Duration;

/// Default mirror serving `go{version}.{os}-{arch}.tar.gz` archives.
pub const DEFAULT_DOWNLOAD_BASE_URL: &str = "https://studygolang.com/dl/golang";

/// Trait for downloading a distribution archive.
///
/// # Examples
///
/// ```no_run
/// use camino::Utf8Path;
/// use godownload_installer::artefact::download::{ArchiveDownloader, HttpDownloader};
///
/// let downloader = HttpDownloader::new(None);
/// downloader.download(
///     "https://go.dev/dl/go1.20.linux-amd64.tar.gz",
///     Utf8Path::new("go1.20.linux-amd64.tar.gz"),
/// )?;
/// # Ok::<(), godownload_installer::artefact::download::DownloadError>(())
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait ArchiveDownloader {
    /// Create or truncate `dest`, then stream the body of `url` into it.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Create`] if `dest` cannot be created,
    /// [`DownloadError::Network`] or [`DownloadError::NotFound`] if the
    /// request fails, and [`DownloadError::Write`] if streaming the body is
    /// interrupted. A partially written file is left in place.
    fn download(&self, url: &str, dest: &Utf8Path) -> Result<(), DownloadError>;
}

/// Errors arising from archive download.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// The destination file could not be created.
    #[error("cannot create {path}")]
    Create {
        /// The destination path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The HTTP request failed or returned a non-success status.
    #[error("download failed for {url}: {reason}")]
    Network {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The requested archive was not found (HTTP 404).
    #[error("archive not found: {url}")]
    NotFound {
        /// The URL that returned 404.
        url: String,
    },

    /// Streaming the response body into the file was interrupted.
    #[error("download of {url} interrupted while writing {path}")]
    Write {
        /// The URL being streamed.
        url: String,
        /// The destination path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Build the archive URL under `base_url`.
///
/// # Examples
///
/// ```
/// use godownload_installer::artefact::download::archive_url;
///
/// let url = archive_url("https://go.dev/dl/", "go1.20.linux-amd64.tar.gz");
/// assert_eq!(url, "https://go.dev/dl/go1.20.linux-amd64.tar.gz");
/// ```
#[must_use]
pub fn archive_url(base_url: &str, archive_name: &str) -> String {
    format!("{}/{archive_name}", base_url.trim_end_matches('/'))
}

/// HTTP-based downloader using `ureq`.
pub struct HttpDownloader {
    agent: ureq::Agent,
}

impl HttpDownloader {
    /// Create a downloader. `timeout` bounds the whole request; `None`
    /// blocks until the transfer completes.
    #[must_use]
    pub fn new(timeout: Option<Duration>) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(timeout)
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
        }
    }
}

impl ArchiveDownloader for HttpDownloader {
    fn download(&self, url: &str, dest: &Utf8Path) -> Result<(), DownloadError> {
        let mut file = std::fs::File::create(dest).map_err(|source| DownloadError::Create {
            path: dest.to_owned(),
            source,
        })?;

        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;

        let bytes = std::io::copy(&mut response.into_body().into_reader(), &mut file).map_err(
            |source| DownloadError::Write {
                url: url.to_owned(),
                path: dest.to_owned(),
                source,
            },
        )?;
        log::debug!(target: "fetch", "wrote {bytes} bytes to {dest}");
        Ok(())
    }
}

/// Map a ureq error to a [`DownloadError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> DownloadError {
    match err {
        ureq::Error::StatusCode(404) => DownloadError::NotFound {
            url: url.to_owned(),
        },
        other => DownloadError::Network {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}
