//! User-facing output for the installer CLI.
//!
//! Progress, warnings, and failures are written to stderr in the user's
//! locale through [`Reporter`]. This module also formats the dry-run plan.

use crate::pipeline::PipelineSettings;
use crate::request::InstallRequest;
use crate::tool_config::ConfigIntent;
use godownload_common::{Arguments, FluentValue, Localizer};
use std::borrow::Cow;
use std::fmt::Display;
use std::io::Write;

/// Write one line to `stderr`, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort output; ignore write failures.
    }
}

/// Render `error` followed by each of its sources, separated by `: `.
///
/// # Examples
///
/// ```
/// use godownload_installer::error::InstallerError;
/// use godownload_installer::output::render_error_chain;
///
/// let err = InstallerError::ProfileRead {
///     path: "/etc/profile".into(),
///     source: std::io::Error::other("permission denied"),
/// };
/// assert_eq!(
///     render_error_chain(&err),
///     "cannot read profile /etc/profile: permission denied"
/// );
/// ```
#[must_use]
pub fn render_error_chain(error: &dyn std::error::Error) -> String {
    let mut rendered = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}

/// Localised stderr reporter.
///
/// Progress lines are suppressed in quiet mode; warnings and errors are
/// always written.
pub struct Reporter<'a> {
    stderr: &'a mut dyn Write,
    localizer: &'a Localizer,
    quiet: bool,
}

impl<'a> Reporter<'a> {
    /// Create a reporter writing to `stderr`.
    pub fn new(stderr: &'a mut dyn Write, localizer: &'a Localizer, quiet: bool) -> Self {
        Self {
            stderr,
            localizer,
            quiet,
        }
    }

    /// Resolve `key` with `args`, falling back to the key itself when the
    /// message is missing.
    #[must_use]
    pub fn text(&self, key: &str, args: &[(&'static str, &dyn Display)]) -> String {
        let arguments: Arguments<'_> = args
            .iter()
            .map(|(name, value)| (Cow::Borrowed(*name), FluentValue::from(value.to_string())))
            .collect();
        let lookup = if arguments.is_empty() {
            self.localizer.message(key)
        } else {
            self.localizer.message_with_args(key, &arguments)
        };
        lookup.unwrap_or_else(|err| {
            log::warn!(target: "i18n", "{err}");
            key.to_owned()
        })
    }

    /// Write a progress line unless quiet.
    pub fn progress(&mut self, key: &str, args: &[(&'static str, &dyn Display)]) {
        if !self.quiet {
            let line = self.text(key, args);
            write_stderr_line(self.stderr, line);
        }
    }

    /// Write a line regardless of quiet mode.
    pub fn always(&mut self, key: &str, args: &[(&'static str, &dyn Display)]) {
        let line = self.text(key, args);
        write_stderr_line(self.stderr, line);
    }

    /// Write unlocalised text regardless of quiet mode.
    pub fn raw(&mut self, message: impl Display) {
        write_stderr_line(self.stderr, message);
    }
}

/// The resolved plan printed by `--dry-run`.
///
/// # Example
///
/// ```
/// use camino::Utf8PathBuf;
/// use godownload_installer::output::DryRunInfo;
/// use godownload_installer::pipeline::PipelineSettings;
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
/// let settings = PipelineSettings::default();
/// let info = DryRunInfo::new(&request, &settings);
///
/// let text = info.display_text();
/// assert!(text.contains("go1.20.linux-amd64.tar.gz"));
/// assert!(text.contains("GO111MODULE=on"));
/// ```
#[derive(Debug)]
pub struct DryRunInfo<'a> {
    /// The installation request.
    pub request: &'a InstallRequest,
    /// The pipeline settings.
    pub settings: &'a PipelineSettings,
    /// The `go env -w` assignments that would be made.
    pub intents: Vec<ConfigIntent>,
}

impl<'a> DryRunInfo<'a> {
    /// Collect the plan for `request` under `settings`.
    #[must_use]
    pub fn new(request: &'a InstallRequest, settings: &'a PipelineSettings) -> Self {
        Self {
            request,
            settings,
            intents: settings.intents(request),
        }
    }

    /// Format the plan for display, one item per line.
    #[must_use]
    pub fn display_text(&self) -> String {
        let settings = self.settings;
        let mut lines = vec![
            format!("Download URL: {}", settings.archive_url(self.request)),
            format!("Archive: {}", settings.archive_path(self.request)),
            format!("Install directory: {}", self.request.install_dir()),
            format!("GOPATH: {}", self.request.go_path()),
            format!("Profile: {}", settings.profile_path),
            format!("Refresh script: {}", settings.refresh_script_path),
            format!("Apply environment: {}", settings.apply_environment),
        ];

        if settings.configure_tool {
            lines.push("Tool configuration:".to_owned());
            for intent in &self.intents {
                lines.push(format!("  go env -w {}", intent.assignment()));
            }
        } else {
            lines.push("Tool configuration: skipped".to_owned());
        }

        lines.join("\n")
    }
}
