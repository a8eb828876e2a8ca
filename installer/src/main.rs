//! godownload CLI entrypoint.
//!
//! This binary downloads a Go distribution, installs it under the chosen
//! root, wires `PATH` and `GOPATH` into the shell profile, and configures the
//! `go` tool. Progress and diagnostics are written to stderr in the user's
//! locale.

use clap::Parser;
use godownload_common::{LocaleCandidates, Localizer, resolve_localizer};
use godownload_installer::artefact::download::HttpDownloader;
use godownload_installer::artefact::extraction::GzipExtractor;
use godownload_installer::cli::Cli;
use godownload_installer::command::SystemCommandExecutor;
use godownload_installer::config::{InstallerConfig, resolve};
use godownload_installer::dirs::SystemBaseDirs;
use godownload_installer::error::{InstallerError, StageFailure};
use godownload_installer::output::{DryRunInfo, Reporter, render_error_chain};
use godownload_installer::pipeline::{Collaborators, Pipeline};

/// A fatal error and the message key it is reported under.
#[derive(Debug)]
struct Failure {
    key: &'static str,
    error: InstallerError,
}

impl Failure {
    const fn config(error: InstallerError) -> Self {
        Self {
            key: "failure-config",
            error,
        }
    }

    const fn request(error: InstallerError) -> Self {
        Self {
            key: "failure-request",
            error,
        }
    }
}

impl From<StageFailure> for Failure {
    fn from(failure: StageFailure) -> Self {
        Self {
            key: failure.stage.failure_key(),
            error: failure.source,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .format_timestamp(None)
        .init();

    let config = InstallerConfig::load(cli.config.as_deref(), &SystemBaseDirs);
    let candidates = LocaleCandidates::from_process_env(
        cli.locale.as_deref(),
        config.as_ref().ok().and_then(InstallerConfig::locale),
    );
    let selection = resolve_localizer(&candidates);
    selection.log_outcome("i18n");
    let localizer: Localizer = selection.into_localizer();

    let mut stderr = std::io::stderr();
    let mut reporter = Reporter::new(&mut stderr, &localizer, cli.quiet);
    let run_result = config
        .map_err(Failure::config)
        .and_then(|config| run(&cli, &config, &mut reporter));
    let exit_code = exit_code_for_run_result(run_result, &mut reporter);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, config: &InstallerConfig, reporter: &mut Reporter<'_>) -> Result<(), Failure> {
    let resolved = resolve(cli, config).map_err(Failure::request)?;

    if cli.dry_run {
        reporter.always("dry-run-header", &[]);
        reporter.raw(DryRunInfo::new(&resolved.request, &resolved.settings).display_text());
        return Ok(());
    }

    let downloader = HttpDownloader::new(resolved.download_timeout);
    let extractor = GzipExtractor::default();
    let executor = SystemCommandExecutor;
    let collaborators = Collaborators {
        downloader: &downloader,
        extractor: &extractor,
        executor: &executor,
    };

    let report = Pipeline::new(&resolved.request, &resolved.settings, collaborators).run(reporter)?;
    log::info!(
        target: "godownload",
        "installed {} with {} warning(s)",
        report.install_dir,
        report.warnings.len()
    );
    Ok(())
}

fn exit_code_for_run_result(result: Result<(), Failure>, reporter: &mut Reporter<'_>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(failure) => {
            let error = render_error_chain(&failure.error);
            reporter.always(failure.key, &[("error", &error)]);
            if failure.error.is_descriptor_exhaustion() {
                reporter.always("hint-open-files", &[]);
            }
            1
        }
    }
}
