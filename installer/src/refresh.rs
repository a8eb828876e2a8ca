//! Profile refresh script.
//!
//! Writes a tiny bash script that sources the shell profile and runs it. The
//! script only affects its own process, so a failure here is reported as a
//! warning with instructions to source the profile by hand.

use crate::command::{CommandExecutor, failure_message};
use crate::error::{InstallerError, Result};
use camino::Utf8Path;

/// Default location of the refresh script.
pub const DEFAULT_REFRESH_SCRIPT_PATH: &str = "/tmp/updateenv.sh";

/// Script text that sources `profile`.
#[must_use]
pub fn script_content(profile: &Utf8Path) -> String {
    format!("#!/bin/bash\nsource {}\n", shell_quote(profile.as_str()))
}

/// Quote `word` for bash. Plain paths are left as they are.
fn shell_quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '.' | '_' | '-' | '+' | ':' | ','));
    if plain {
        word.to_owned()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

/// Write the refresh script for `profile` to `path` and execute it with
/// bash.
///
/// # Errors
///
/// Returns [`InstallerError::RefreshScript`] if the script cannot be
/// written, made executable, started, or exits unsuccessfully.
pub fn refresh_profile(
    executor: &dyn CommandExecutor,
    path: &Utf8Path,
    profile: &Utf8Path,
) -> Result<()> {
    let failure = |reason: String| InstallerError::RefreshScript {
        path: path.to_owned(),
        reason,
    };

    write_script(path, &script_content(profile))
        .map_err(|e| failure(format!("cannot write script: {e}")))?;
    let output = executor
        .run("bash", &[path.as_str()], &[])
        .map_err(|e| failure(e.to_string()))?;
    if !output.status.success() {
        return Err(failure(failure_message(&output)));
    }
    Ok(())
}

/// Writes an executable shell script (rwxr-xr-x on Unix).
fn write_script(path: &Utf8Path, content: &str) -> std::io::Result<()> {
    std::fs::write(path, content)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let mut perms = std::fs::metadata(path)?.permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(path, perms)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ExpectedCall, StubExecutor, failure_output, success_output};
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    fn script_path(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::try_from(dir.path().join("updateenv.sh")).expect("utf-8 path")
    }

    #[test]
    fn writes_and_runs_the_script() {
        let dir = TempDir::new().expect("temp dir");
        let path = script_path(&dir);
        let executor = StubExecutor::new(vec![ExpectedCall::new(
            "bash",
            [path.as_str()],
            Ok(success_output()),
        )]);

        refresh_profile(&executor, &path, Utf8Path::new("/etc/profile")).expect("refresh works");

        executor.assert_finished();
        assert_eq!(
            std::fs::read_to_string(&path).expect("script written"),
            "#!/bin/bash\nsource /etc/profile\n"
        );
    }

    #[test]
    fn script_quotes_awkward_profile_paths() {
        assert_eq!(
            script_content(Utf8Path::new("/home/go pher/.profile")),
            "#!/bin/bash\nsource '/home/go pher/.profile'\n"
        );
        assert_eq!(
            script_content(Utf8Path::new("/tmp/it's; rm -rf $HOME")),
            "#!/bin/bash\nsource '/tmp/it'\\''s; rm -rf $HOME'\n"
        );
    }

    #[cfg(unix)]
    #[test]
    fn script_is_executable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().expect("temp dir");
        let path = script_path(&dir);

        write_script(&path, "#!/bin/bash\n").expect("script written");

        let mode = std::fs::metadata(&path).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[test]
    fn failing_script_is_reported() {
        let dir = TempDir::new().expect("temp dir");
        let path = script_path(&dir);
        let executor = StubExecutor::new(vec![ExpectedCall::new(
            "bash",
            [path.as_str()],
            Ok(failure_output("source: not found")),
        )]);

        let err = refresh_profile(&executor, &path, Utf8Path::new("/etc/profile"))
            .expect_err("script fails");

        assert!(
            matches!(err, InstallerError::RefreshScript { ref reason, .. } if reason.contains("not found"))
        );
    }

    #[test]
    fn unwritable_location_is_reported_before_running() {
        let dir = TempDir::new().expect("temp dir");
        let path = Utf8PathBuf::try_from(dir.path().join("missing/updateenv.sh"))
            .expect("utf-8 path");
        let executor = StubExecutor::new(Vec::new());

        let err = refresh_profile(&executor, &path, Utf8Path::new("/etc/profile"))
            .expect_err("directory is missing");

        assert!(matches!(err, InstallerError::RefreshScript { .. }));
        assert!(executor.recorded().is_empty());
    }
}
