//! GOPATH working directory provisioning.

use crate::error::{InstallerError, Result};
use crate::request::InstallRequest;
use camino::{Utf8Path, Utf8PathBuf};

/// Create `path` and any missing parents. Succeeds if it already exists.
///
/// # Errors
///
/// Returns [`InstallerError::DirectoryProvision`] if the directory cannot be
/// created.
pub fn ensure_directory(path: &Utf8Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|source| InstallerError::DirectoryProvision {
        path: path.to_owned(),
        source,
    })
}

/// Create every working directory of `request`, returning them in order.
///
/// # Errors
///
/// Returns the first [`InstallerError::DirectoryProvision`] encountered.
pub fn provision_working_dirs(request: &InstallRequest) -> Result<Vec<Utf8PathBuf>> {
    let dirs = request.working_dirs();
    for dir in &dirs {
        ensure_directory(dir)?;
        log::debug!(target: "provision", "ensured {dir}");
    }
    Ok(dirs)
}
