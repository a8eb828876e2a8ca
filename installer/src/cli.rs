//! CLI argument definitions for the godownload installer.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the main entrypoint to keep the binary small and focused on
//! orchestration. Every setting is optional here; defaults and configuration
//! file values are merged in [`crate::config::resolve`].

use camino::Utf8PathBuf;
use clap::Parser;

/// Download, install, and configure a Go toolchain.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "godownload")]
#[command(version, about)]
#[command(long_about = concat!(
    "Download, install, and configure a Go toolchain.\n\n",
    "The installer fetches go{version}.{os}-{arch}.tar.gz from a mirror, ",
    "extracts the go/ tree, moves it to {root}/go, creates the GOPATH at ",
    "{root}/go/path, appends PATH and GOPATH exports to the shell profile, and ",
    "persists GO111MODULE, GOPATH and GOPROXY with `go env -w`.\n\n",
    "Writing to /usr/local and /etc/profile usually requires root.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Install Go 1.20 under /usr/local:\n",
    "    $ sudo godownload\n\n",
    "  Install Go 1.21.5 under /opt:\n",
    "    $ sudo godownload -g 1.21.5 -r /opt\n\n",
    "  Use the official mirror and a per-user profile:\n",
    "    $ godownload --mirror https://go.dev/dl -r ~/.local --profile ~/.profile\n\n",
    "  Preview without touching the system:\n",
    "    $ godownload --dry-run\n\n",
    "CONFIGURATION:\n",
    "  Defaults can be set in config.toml in the platform configuration directory\n",
    "  (for example ~/.config/godownload/config.toml) or in the file named by\n",
    "  --config. Command-line flags take precedence.",
))]
pub struct Cli {
    /// Go version to install [default: 1.20].
    #[arg(short = 'g', long = "go-version", visible_alias = "gv", value_name = "VERSION")]
    pub go_version: Option<String>,

    /// Install root; Go lands in ROOT/go [default: /usr/local].
    #[arg(short = 'r', long = "root", visible_alias = "gr", value_name = "DIR")]
    pub root: Option<Utf8PathBuf>,

    /// Target operating system, using Go names [default: host].
    #[arg(long, value_name = "GOOS")]
    pub os: Option<String>,

    /// Target architecture, using Go names [default: host].
    #[arg(long, value_name = "GOARCH")]
    pub arch: Option<String>,

    /// Base URL serving the Go archives [default: https://studygolang.com/dl/golang].
    #[arg(long, value_name = "URL")]
    pub mirror: Option<String>,

    /// Shell profile receiving the exports [default: /etc/profile].
    #[arg(long, value_name = "FILE")]
    pub profile: Option<Utf8PathBuf>,

    /// Directory for the downloaded archive and extracted tree [default: .].
    #[arg(long, value_name = "DIR")]
    pub work_dir: Option<Utf8PathBuf>,

    /// Configuration file to load instead of the per-user one.
    #[arg(long, value_name = "FILE", env = "GODOWNLOAD_CONFIG")]
    pub config: Option<Utf8PathBuf>,

    /// Language for messages, such as en-GB or zh-CN.
    #[arg(long, value_name = "LOCALE")]
    pub locale: Option<String>,

    /// Abort the download after this many seconds [default: no limit].
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Do not copy the profile's environment into this process.
    #[arg(long)]
    pub no_apply_env: bool,

    /// Skip the `go env -w` configuration.
    #[arg(long)]
    pub skip_tool_config: bool,

    /// Show the resolved plan and exit without changing anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Suppress progress output (warnings and errors still shown).
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

impl Cli {
    /// The log level implied by `--quiet` and `-v` repetitions.
    ///
    /// # Examples
    ///
    /// ```
    /// use clap::Parser;
    /// use godownload_installer::cli::Cli;
    ///
    /// let cli = Cli::parse_from(["godownload", "-vv"]);
    /// assert_eq!(cli.log_level(), log::LevelFilter::Debug);
    /// ```
    #[must_use]
    pub const fn log_level(&self) -> log::LevelFilter {
        if self.quiet {
            return log::LevelFilter::Error;
        }
        match self.verbosity {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
