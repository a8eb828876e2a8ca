//! Shell profile update.
//!
//! The GOPATH value doubles as the idempotence marker: when it appears
//! anywhere in the profile, the export lines are assumed to be present and
//! the file is left untouched.

use crate::error::{InstallerError, Result};
use crate::request::InstallRequest;
use camino::{Utf8Path, Utf8PathBuf};

/// Default shell profile shared by all login shells.
pub const DEFAULT_PROFILE_PATH: &str = "/etc/profile";

/// What [`update_profile`] did to the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileOutcome {
    /// The export lines were appended.
    Appended,
    /// The marker was already present; nothing was written.
    AlreadyPresent,
}

/// The full text of a shell profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileDocument {
    path: Utf8PathBuf,
    text: String,
}

impl ProfileDocument {
    /// Read the profile at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::ProfileRead`] if the file cannot be read,
    /// including when it does not exist.
    pub fn read(path: &Utf8Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| InstallerError::ProfileRead {
            path: path.to_owned(),
            source,
        })?;
        Ok(Self {
            path: path.to_owned(),
            text,
        })
    }

    /// The profile's location.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// The profile's current text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether `marker` occurs anywhere in the text.
    #[must_use]
    pub fn contains_marker(&self, marker: &str) -> bool {
        self.text.contains(marker)
    }

    /// Append the `PATH` and `GOPATH` exports, starting on a fresh line.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8Path;
    /// use godownload_installer::profile::ProfileDocument;
    ///
    /// # let dir = tempfile::tempdir()?;
    /// # let path = camino::Utf8PathBuf::try_from(dir.path().join("profile")).expect("utf-8");
    /// # std::fs::write(&path, "umask 022")?;
    /// let mut document = ProfileDocument::read(&path)?;
    /// document.append_exports(Utf8Path::new("/usr/local/go/bin"), Utf8Path::new("/usr/local/go/path"));
    /// assert_eq!(
    ///     document.text(),
    ///     "umask 022\nexport PATH=$PATH:/usr/local/go/bin\nexport GOPATH=/usr/local/go/path\n"
    /// );
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn append_exports(&mut self, bin_dir: &Utf8Path, go_path: &Utf8Path) {
        if !self.text.is_empty() && !self.text.ends_with('\n') {
            self.text.push('\n');
        }
        self.text.push_str(&format!("export PATH=$PATH:{bin_dir}\n"));
        self.text.push_str(&format!("export GOPATH={go_path}\n"));
    }

    /// Write the text back to the profile.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::ProfileWrite`] if the file cannot be written.
    pub fn write(&self) -> Result<()> {
        std::fs::write(&self.path, &self.text).map_err(|source| InstallerError::ProfileWrite {
            path: self.path.clone(),
            source,
        })
    }
}

/// Append the toolchain exports for `request` to the profile at `path`
/// unless its GOPATH marker is already there.
///
/// # Errors
///
/// Returns [`InstallerError::ProfileRead`] or [`InstallerError::ProfileWrite`]
/// when the profile cannot be read or written.
pub fn update_profile(request: &InstallRequest, path: &Utf8Path) -> Result<ProfileOutcome> {
    let go_path = request.go_path();
    let mut document = ProfileDocument::read(path)?;
    if document.contains_marker(go_path.as_str()) {
        log::debug!(target: "profile", "{path} already exports {go_path}");
        return Ok(ProfileOutcome::AlreadyPresent);
    }
    document.append_exports(&request.bin_dir(), &go_path);
    document.write()?;
    Ok(ProfileOutcome::Appended)
}
