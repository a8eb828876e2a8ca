//! Directory resolution abstraction for platform-specific paths.
//!
//! The installer looks for its configuration file in the per-user config
//! directory reported by `directories-next` (for example
//! `~/.config/godownload` on Linux). Tests substitute their own
//! implementation of [`BaseDirs`].

use camino::Utf8PathBuf;
use directories_next::ProjectDirs;

/// File name of the installer configuration inside [`BaseDirs::config_dir`].
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Abstraction over platform directory lookup.
pub trait BaseDirs {
    /// The installer's configuration directory, if one can be determined.
    fn config_dir(&self) -> Option<Utf8PathBuf>;

    /// The default configuration file path.
    fn config_file(&self) -> Option<Utf8PathBuf> {
        self.config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
    }
}

/// [`BaseDirs`] backed by `directories-next`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBaseDirs;

impl BaseDirs for SystemBaseDirs {
    fn config_dir(&self) -> Option<Utf8PathBuf> {
        let dirs = ProjectDirs::from("", "", "godownload")?;
        match Utf8PathBuf::from_path_buf(dirs.config_dir().to_path_buf()) {
            Ok(path) => Some(path),
            Err(path) => {
                log::debug!(target: "config", "ignoring non UTF-8 config dir {}", path.display());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedDirs(Option<Utf8PathBuf>);

    impl BaseDirs for FixedDirs {
        fn config_dir(&self) -> Option<Utf8PathBuf> {
            self.0.clone()
        }
    }

    #[test]
    fn config_file_lives_in_config_dir() {
        let dirs = FixedDirs(Some(Utf8PathBuf::from("/home/gopher/.config/godownload")));
        assert_eq!(
            dirs.config_file(),
            Some(Utf8PathBuf::from("/home/gopher/.config/godownload/config.toml"))
        );
    }

    #[test]
    fn no_config_dir_means_no_config_file() {
        assert!(FixedDirs(None).config_file().is_none());
    }
}
