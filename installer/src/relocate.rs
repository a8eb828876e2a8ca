//! Installation directory replacement.
//!
//! Moves the extracted tree into the installation directory, discarding
//! whatever was there before. The replacement is not atomic: a failure after
//! the old directory is removed leaves no installation behind.

use crate::error::{InstallerError, Result};
use camino::Utf8Path;
use std::fs;
use std::io;
use std::path::Path;
use walkdir::WalkDir;

/// Replace `destination` with the tree at `source`.
///
/// Existing content at `destination` is removed first (recursively for a
/// directory, unlinked for a file or symlink), the parent is created, and
/// `source` is renamed into place. A rename across filesystems falls back to
/// a recursive copy followed by removal of `source`.
///
/// # Errors
///
/// Returns [`InstallerError::Relocation`] when `source` and `destination`
/// overlap (one is the other or lies inside it), when `source` is missing, or
/// when any filesystem step fails. Nothing is removed in those cases.
///
/// # Examples
///
/// ```no_run
/// use camino::Utf8Path;
/// use godownload_installer::relocate::relocate;
///
/// relocate(Utf8Path::new("./go"), Utf8Path::new("/usr/local/go"))?;
/// # Ok::<(), godownload_installer::error::InstallerError>(())
/// ```
pub fn relocate(source: &Utf8Path, destination: &Utf8Path) -> Result<()> {
    let failure = |reason: String| InstallerError::Relocation {
        from: source.to_owned(),
        to: destination.to_owned(),
        reason,
    };

    if !source.exists() {
        return Err(failure("extracted tree does not exist".to_owned()));
    }
    if overlapping(source, destination) {
        return Err(failure(
            "extracted tree and installation directory overlap".to_owned(),
        ));
    }

    remove_existing(destination).map_err(|e| failure(format!("cannot remove old tree: {e}")))?;
    if let Some(parent) = destination.parent().filter(|p| !p.as_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| failure(format!("cannot create {parent}: {e}")))?;
    }

    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            log::debug!(target: "relocate", "rename crosses devices, copying {source} instead");
            copy_tree(source.as_std_path(), destination.as_std_path())
                .map_err(|e| failure(format!("copy across devices failed: {e}")))?;
            fs::remove_dir_all(source)
                .map_err(|e| failure(format!("cannot remove {source} after copy: {e}")))
        }
        Err(e) => Err(failure(e.to_string())),
    }
}

/// Remove a `tree` left in the work directory by an earlier run so a new
/// extraction starts empty.
///
/// # Errors
///
/// Returns [`InstallerError::Relocation`] without touching anything when
/// `tree` overlaps `install_dir`, and [`InstallerError::Io`] when the old
/// tree cannot be removed.
pub fn clear_stale_tree(tree: &Utf8Path, install_dir: &Utf8Path) -> Result<()> {
    if overlapping(tree, install_dir) {
        return Err(InstallerError::Relocation {
            from: tree.to_owned(),
            to: install_dir.to_owned(),
            reason: "work directory overlaps the installation directory".to_owned(),
        });
    }
    if fs::symlink_metadata(tree).is_ok() {
        log::debug!(target: "relocate", "removing stale tree {tree}");
    }
    remove_existing(tree)?;
    Ok(())
}

/// Whether either path contains the other once symlinks and `..` are
/// resolved. A destination that does not exist yet cannot be removed, so only
/// the literal comparison applies to it.
fn overlapping(source: &Utf8Path, destination: &Utf8Path) -> bool {
    if source.starts_with(destination) || destination.starts_with(source) {
        return true;
    }
    match (source.canonicalize_utf8(), destination.canonicalize_utf8()) {
        (Ok(a), Ok(b)) => a.starts_with(&b) || b.starts_with(&a),
        _ => false,
    }
}

fn remove_existing(path: &Utf8Path) -> io::Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Recursively copy `source` to `destination`, preserving file modes and
/// recreating symlinks on Unix.
fn copy_tree(source: &Path, destination: &Path) -> io::Result<()> {
    for entry in WalkDir::new(source) {
        let entry = entry.map_err(io::Error::other)?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(io::Error::other)?;
        let target = destination.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
            fs::set_permissions(&target, entry.metadata().map_err(io::Error::other)?.permissions())?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(link: &Path, target: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(fs::read_link(link)?, target)
}

#[cfg(not(unix))]
fn copy_symlink(link: &Path, _target: &Path) -> io::Result<()> {
    log::warn!(target: "relocate", "skipping symlink {}", link.display());
    Ok(())
}
