//! Provisioning pipeline orchestration.
//!
//! Runs the installation stages in a fixed order: fetch, extract, relocate,
//! provision, profile, and configure. Each stage runs only when the previous
//! one succeeded, so a failure leaves the system in a state that can be read
//! off the stage that failed. Environment propagation and the refresh script
//! are best-effort and are downgraded to [`StageWarning`]s.

use crate::artefact::download::{ArchiveDownloader, DEFAULT_DOWNLOAD_BASE_URL, archive_url};
use crate::artefact::extraction::ArchiveExtractor;
use crate::command::CommandExecutor;
use crate::environment::{EnvironmentSnapshot, capture_environment};
use crate::error::{InstallerError, StageFailure};
use crate::output::{Reporter, render_error_chain};
use crate::profile::{DEFAULT_PROFILE_PATH, ProfileOutcome, update_profile};
use crate::provision::provision_working_dirs;
use crate::refresh::{DEFAULT_REFRESH_SCRIPT_PATH, refresh_profile};
use crate::relocate::{clear_stale_tree, relocate};
use crate::request::{DISTRIBUTION_DIR, InstallRequest};
use crate::tool_config::{ConfigIntent, DEFAULT_MODULE_PROXIES, apply_configuration, intents_for};
use camino::Utf8PathBuf;
use std::fmt;

/// A fatal pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Download the distribution archive.
    Fetch,
    /// Unpack the archive into the work directory.
    Extract,
    /// Replace the installation directory.
    Relocate,
    /// Create the GOPATH working directories.
    Provision,
    /// Append the exports to the shell profile.
    Profile,
    /// Persist `go env -w` settings.
    Configure,
}

impl Stage {
    /// Lower-case stage name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Extract => "extract",
            Self::Relocate => "relocate",
            Self::Provision => "provision",
            Self::Profile => "profile",
            Self::Configure => "configure",
        }
    }

    /// Message key of the localised failure diagnostic.
    #[must_use]
    pub const fn failure_key(self) -> &'static str {
        match self {
            Self::Fetch => "failure-fetch",
            Self::Extract => "failure-extract",
            Self::Relocate => "failure-relocate",
            Self::Provision => "failure-provision",
            Self::Profile => "failure-profile",
            Self::Configure => "failure-configure",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Settings shared by every stage, resolved before the pipeline starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Mirror the archive is fetched from.
    pub download_base_url: String,
    /// Directory receiving the archive and the extracted tree.
    pub work_dir: Utf8PathBuf,
    /// Shell profile to update.
    pub profile_path: Utf8PathBuf,
    /// Location of the refresh script.
    pub refresh_script_path: Utf8PathBuf,
    /// `GOPROXY` entries, joined with commas.
    pub module_proxies: Vec<String>,
    /// Additional `go env -w` assignments, applied after the built-in ones.
    pub extra_tool_env: Vec<ConfigIntent>,
    /// Copy the captured environment into this process.
    pub apply_environment: bool,
    /// Run the `go env -w` configuration.
    pub configure_tool: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            download_base_url: DEFAULT_DOWNLOAD_BASE_URL.to_owned(),
            work_dir: Utf8PathBuf::from("."),
            profile_path: Utf8PathBuf::from(DEFAULT_PROFILE_PATH),
            refresh_script_path: Utf8PathBuf::from(DEFAULT_REFRESH_SCRIPT_PATH),
            module_proxies: DEFAULT_MODULE_PROXIES.map(str::to_owned).to_vec(),
            extra_tool_env: Vec::new(),
            apply_environment: true,
            configure_tool: true,
        }
    }
}

impl PipelineSettings {
    /// URL of the archive for `request`.
    #[must_use]
    pub fn archive_url(&self, request: &InstallRequest) -> String {
        archive_url(&self.download_base_url, &request.archive_name())
    }

    /// Local path the archive is downloaded to.
    #[must_use]
    pub fn archive_path(&self, request: &InstallRequest) -> Utf8PathBuf {
        self.work_dir.join(request.archive_name())
    }

    /// Directory the archive's `go/` tree is extracted to.
    #[must_use]
    pub fn extracted_tree(&self) -> Utf8PathBuf {
        self.work_dir.join(DISTRIBUTION_DIR)
    }

    /// The `go env -w` assignments for `request`.
    #[must_use]
    pub fn intents(&self, request: &InstallRequest) -> Vec<ConfigIntent> {
        intents_for(request, &self.module_proxies, &self.extra_tool_env)
    }
}

/// External collaborators the pipeline delegates to.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    /// Fetches the archive.
    pub downloader: &'a dyn ArchiveDownloader,
    /// Unpacks the archive.
    pub extractor: &'a dyn ArchiveExtractor,
    /// Runs bash and the installed `go` tool.
    pub executor: &'a dyn CommandExecutor,
}

/// A failure that did not stop the installation.
#[derive(Debug)]
pub enum StageWarning {
    /// The profile could not be sourced to capture the environment.
    Environment(InstallerError),
    /// The refresh script could not be written or run.
    Refresh(InstallerError),
}

/// Outcome of a successful run.
#[derive(Debug)]
pub struct InstallReport {
    /// Where the toolchain now lives (`GOROOT`).
    pub install_dir: Utf8PathBuf,
    /// What happened to the shell profile.
    pub profile: ProfileOutcome,
    /// The environment captured after sourcing the profile, if that worked.
    pub environment: Option<EnvironmentSnapshot>,
    /// Number of `go env -w` assignments applied.
    pub configured_keys: usize,
    /// Downgraded failures, in the order they happened.
    pub warnings: Vec<StageWarning>,
}

/// The six-stage installation pipeline.
pub struct Pipeline<'a> {
    request: &'a InstallRequest,
    settings: &'a PipelineSettings,
    collaborators: Collaborators<'a>,
}

impl<'a> Pipeline<'a> {
    /// Bind a request, its settings, and the collaborators.
    #[must_use]
    pub const fn new(
        request: &'a InstallRequest,
        settings: &'a PipelineSettings,
        collaborators: Collaborators<'a>,
    ) -> Self {
        Self {
            request,
            settings,
            collaborators,
        }
    }

    /// Run every stage in order, reporting progress through `reporter`.
    ///
    /// # Errors
    ///
    /// Returns a [`StageFailure`] naming the first fatal stage that failed.
    /// Later stages are not attempted.
    pub fn run(&self, reporter: &mut Reporter<'_>) -> Result<InstallReport, StageFailure> {
        let request = self.request;
        let settings = self.settings;

        self.fetch(reporter)?;
        self.extract(reporter)?;

        let install_dir = request.install_dir();
        reporter.progress("stage-relocate-start", &[("path", &install_dir)]);
        at(Stage::Relocate, relocate(&settings.extracted_tree(), &install_dir))?;
        log::info!(target: "pipeline", "relocated toolchain to {install_dir}");

        reporter.progress("stage-provision-start", &[("path", &request.go_path())]);
        at(Stage::Provision, provision_working_dirs(request))?;

        let profile = at(Stage::Profile, update_profile(request, &settings.profile_path))?;
        let profile_key = match profile {
            ProfileOutcome::Appended => "stage-profile-appended",
            ProfileOutcome::AlreadyPresent => "stage-profile-present",
        };
        reporter.progress(profile_key, &[("path", &settings.profile_path)]);

        let mut warnings = Vec::new();
        let environment = self.propagate_environment(reporter, &mut warnings);
        let configured_keys = self.configure(reporter)?;
        reporter.progress("install-complete", &[("version", request.version())]);
        self.refresh(reporter, &mut warnings);

        Ok(InstallReport {
            install_dir,
            profile,
            environment,
            configured_keys,
            warnings,
        })
    }

    fn fetch(&self, reporter: &mut Reporter<'_>) -> Result<(), StageFailure> {
        let url = self.settings.archive_url(self.request);
        let archive = self.settings.archive_path(self.request);
        reporter.progress("stage-fetch-start", &[("url", &url)]);
        at(Stage::Fetch, self.collaborators.downloader.download(&url, &archive))?;
        reporter.progress("stage-fetch-done", &[("path", &archive)]);
        log::info!(target: "pipeline", "fetched {url}");
        Ok(())
    }

    fn extract(&self, reporter: &mut Reporter<'_>) -> Result<(), StageFailure> {
        let archive = self.settings.archive_path(self.request);
        reporter.progress("stage-extract-start", &[("path", &archive)]);
        at(
            Stage::Extract,
            clear_stale_tree(&self.settings.extracted_tree(), &self.request.install_dir()),
        )?;
        let report = at(
            Stage::Extract,
            self.collaborators
                .extractor
                .extract(&archive, &self.settings.work_dir),
        )?;
        reporter.progress("stage-extract-done", &[
            ("count", &report.materialized),
            ("skipped", &report.skipped),
        ]);
        log::info!(target: "pipeline", "extracted {} entries", report.materialized);
        Ok(())
    }

    fn propagate_environment(
        &self,
        reporter: &mut Reporter<'_>,
        warnings: &mut Vec<StageWarning>,
    ) -> Option<EnvironmentSnapshot> {
        let profile = &self.settings.profile_path;
        match capture_environment(self.collaborators.executor, profile) {
            Ok(snapshot) => {
                if self.settings.apply_environment {
                    snapshot.apply();
                }
                reporter.progress("stage-environment-done", &[]);
                Some(snapshot)
            }
            Err(err) => {
                log::debug!(target: "pipeline", "environment propagation failed: {err}");
                let error = render_error_chain(&err);
                reporter.always("warning-environment", &[
                    ("profile", profile),
                    ("error", &error),
                ]);
                warnings.push(StageWarning::Environment(err));
                None
            }
        }
    }

    fn configure(&self, reporter: &mut Reporter<'_>) -> Result<usize, StageFailure> {
        if !self.settings.configure_tool {
            reporter.progress("stage-configure-skipped", &[]);
            return Ok(0);
        }
        let intents = self.settings.intents(self.request);
        reporter.progress("stage-configure-start", &[("count", &intents.len())]);
        at(
            Stage::Configure,
            apply_configuration(
                self.collaborators.executor,
                &self.request.go_binary(),
                &self.request.install_dir(),
                &intents,
            ),
        )
    }

    fn refresh(&self, reporter: &mut Reporter<'_>, warnings: &mut Vec<StageWarning>) {
        let profile = &self.settings.profile_path;
        match refresh_profile(
            self.collaborators.executor,
            &self.settings.refresh_script_path,
            profile,
        ) {
            Ok(()) => {
                reporter.progress("stage-refresh-done", &[("path", profile)]);
                reporter.progress("install-finished", &[]);
            }
            Err(err) => {
                log::debug!(target: "pipeline", "refresh script failed: {err}");
                let error = render_error_chain(&err);
                reporter.always("warning-refresh", &[("error", &error), ("profile", profile)]);
                warnings.push(StageWarning::Refresh(err));
            }
        }
        reporter.progress("install-new-shell", &[("profile", profile)]);
    }
}

/// Attach `stage` to a failed stage result.
fn at<T, E>(stage: Stage, result: Result<T, E>) -> Result<T, StageFailure>
where
    E: Into<InstallerError>,
{
    result.map_err(|err| StageFailure::new(stage, err.into()))
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
