use std::fmt;

use log::{debug, warn};

use super::{FALLBACK_LOCALE, LOCALE_ENV_VAR, Localizer, supports_locale};

/// System variables consulted for the user's language, highest priority
/// first.
pub const SYSTEM_LOCALE_VARS: [&str; 3] = ["LC_ALL", "LC_MESSAGES", "LANG"];

/// Where the effective locale came from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LocaleSource {
    /// The `--locale` flag.
    Flag,
    /// The `GODOWNLOAD_LOCALE` environment variable.
    Environment,
    /// The `locale` key of the configuration file.
    Configuration,
    /// The system locale (`LC_ALL`, `LC_MESSAGES`, or `LANG`).
    System,
    /// Nothing usable was supplied.
    Fallback,
}

impl LocaleSource {
    /// Whether an unsupported value from this source is logged at warn level.
    const fn warns_when_unsupported(self) -> bool {
        matches!(self, Self::Flag | Self::Environment | Self::Configuration)
    }
}

impl fmt::Display for LocaleSource {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag => formatter.write_str("--locale"),
            Self::Environment => formatter.write_str(LOCALE_ENV_VAR),
            Self::Configuration => formatter.write_str("configuration locale"),
            Self::System => formatter.write_str("system locale"),
            Self::Fallback => formatter.write_str("fallback locale"),
        }
    }
}

/// Raw locale candidates, one per [`LocaleSource`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LocaleCandidates<'a> {
    /// Value of `--locale`.
    pub flag: Option<&'a str>,
    /// Value of `GODOWNLOAD_LOCALE`.
    pub environment: Option<String>,
    /// The configuration file's `locale`.
    pub configuration: Option<&'a str>,
    /// The first non-empty system locale variable.
    pub system: Option<String>,
}

impl<'a> LocaleCandidates<'a> {
    /// Combine the flag and configuration values with the process
    /// environment.
    #[must_use]
    pub fn from_process_env(flag: Option<&'a str>, configuration: Option<&'a str>) -> Self {
        let system = SYSTEM_LOCALE_VARS.iter().find_map(|name| {
            std::env::var(name)
                .ok()
                .filter(|value| !value.trim().is_empty())
        });
        Self {
            flag,
            environment: std::env::var(LOCALE_ENV_VAR).ok(),
            configuration,
            system,
        }
    }

    fn ordered(&self) -> [(LocaleSource, Option<&str>); 4] {
        [
            (LocaleSource::Flag, self.flag),
            (LocaleSource::Environment, self.environment.as_deref()),
            (LocaleSource::Configuration, self.configuration),
            (LocaleSource::System, self.system.as_deref()),
        ]
    }
}

/// The chosen localizer and where its locale came from.
#[derive(Clone, Debug)]
pub struct LocaleSelection {
    localizer: Localizer,
    source: LocaleSource,
}

impl LocaleSelection {
    /// Where the locale came from.
    #[must_use]
    pub const fn source(&self) -> LocaleSource {
        self.source
    }

    /// The selected localizer.
    #[must_use]
    pub const fn localizer(&self) -> &Localizer {
        &self.localizer
    }

    /// Consume the selection, yielding the [`Localizer`].
    #[must_use]
    pub fn into_localizer(self) -> Localizer {
        self.localizer
    }

    /// Log which source won under `target`.
    pub fn log_outcome(&self, target: &str) {
        debug!(
            target: target,
            "using locale `{}` from {}",
            self.localizer.locale(),
            self.source,
        );
    }
}

/// Pick the first supported candidate in flag, environment, configuration,
/// system order, falling back to
/// [`FALLBACK_LOCALE`](super::FALLBACK_LOCALE).
///
/// # Examples
///
/// ```
/// use godownload_common::i18n::{LocaleCandidates, LocaleSource, resolve_localizer};
///
/// let selection = resolve_localizer(&LocaleCandidates {
///     flag: Some("xx"),
///     system: Some("zh_CN.UTF-8".to_owned()),
///     ..LocaleCandidates::default()
/// });
/// assert_eq!(selection.source(), LocaleSource::System);
/// assert_eq!(selection.localizer().locale(), "zh-CN");
/// ```
#[must_use]
pub fn resolve_localizer(candidates: &LocaleCandidates<'_>) -> LocaleSelection {
    for (source, raw) in candidates.ordered() {
        let Some(tag) = normalise_locale(raw) else {
            continue;
        };
        if supports_locale(tag) {
            return LocaleSelection {
                localizer: Localizer::new(Some(tag)),
                source,
            };
        }
        if source.warns_when_unsupported() {
            warn!(target: "i18n", "ignoring unsupported {source} `{tag}`");
        } else {
            debug!(target: "i18n", "ignoring unsupported {source} `{tag}`");
        }
    }
    debug!(target: "i18n", "no usable locale; using {FALLBACK_LOCALE}");
    LocaleSelection {
        localizer: Localizer::new(None),
        source: LocaleSource::Fallback,
    }
}

/// Trim whitespace and discard empty locale values.
#[must_use]
pub fn normalise_locale(input: Option<&str>) -> Option<&str> {
    input.map(str::trim).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn candidates<'a>(
        flag: Option<&'a str>,
        environment: Option<&str>,
        configuration: Option<&'a str>,
        system: Option<&str>,
    ) -> LocaleCandidates<'a> {
        LocaleCandidates {
            flag,
            environment: environment.map(str::to_owned),
            configuration,
            system: system.map(str::to_owned),
        }
    }

    #[rstest]
    #[case(candidates(None, None, None, None), LocaleSource::Fallback, "en-GB")]
    #[case(candidates(Some("zh-CN"), Some("en-GB"), None, None), LocaleSource::Flag, "zh-CN")]
    #[case(candidates(None, Some("zh-CN"), Some("en-GB"), None), LocaleSource::Environment, "zh-CN")]
    #[case(candidates(None, None, Some(" zh-CN "), Some("en_GB.UTF-8")), LocaleSource::Configuration, "zh-CN")]
    #[case(candidates(None, None, None, Some("zh_CN.UTF-8")), LocaleSource::System, "zh-CN")]
    #[case(candidates(Some("zz"), Some("yy"), Some("en-GB"), None), LocaleSource::Configuration, "en-GB")]
    #[case(candidates(Some("  "), None, None, Some("C.UTF-8")), LocaleSource::Fallback, "en-GB")]
    fn resolves_sources_in_priority_order(
        #[case] input: LocaleCandidates<'static>,
        #[case] expected_source: LocaleSource,
        #[case] expected_locale: &str,
    ) {
        let selection = resolve_localizer(&input);
        assert_eq!(selection.source(), expected_source);
        assert_eq!(selection.localizer().locale(), expected_locale);
    }

    #[test]
    fn reads_candidates_from_the_process_environment() {
        temp_env::with_vars(
            [
                (LOCALE_ENV_VAR, Some("zh-CN")),
                ("LC_ALL", None),
                ("LC_MESSAGES", Some("")),
                ("LANG", Some("en_GB.UTF-8")),
            ],
            || {
                let found = LocaleCandidates::from_process_env(Some("en-GB"), None);
                assert_eq!(found.flag, Some("en-GB"));
                assert_eq!(found.environment.as_deref(), Some("zh-CN"));
                assert_eq!(found.system.as_deref(), Some("en_GB.UTF-8"));
            },
        );
    }

    #[rstest]
    #[case(None, None)]
    #[case(Some(""), None)]
    #[case(Some("  "), None)]
    #[case(Some(" en-GB "), Some("en-GB"))]
    fn normalises_candidates(#[case] input: Option<&str>, #[case] expected: Option<&str>) {
        assert_eq!(normalise_locale(input), expected);
    }
}
