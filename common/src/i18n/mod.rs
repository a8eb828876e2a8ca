//! Localisation loader and helpers for installer messages.
//!
//! The loader embeds the Fluent resources under the workspace `locales/`
//! directory so the installer can resolve translated strings without touching
//! the filesystem at runtime. [`Localizer`] is a thin wrapper around
//! `fluent-templates` that records whether the fallback bundle was used and
//! surfaces missing messages as errors.
//!
//! Locale resolution is handled by [`resolve_localizer`], which walks the
//! `--locale` flag, the `GODOWNLOAD_LOCALE` environment variable, the
//! configuration file, and the system locale before falling back to the
//! bundled English messages.

use fluent_templates::static_loader;
use unic_langid::langid;

/// Re-export the Fluent value type for constructing message arguments.
pub use fluent_templates::fluent_bundle::FluentValue;
pub use fluent_templates::loader::LanguageIdentifier;

const FALLBACK_LITERAL: &str = "en-GB";

static_loader! {
    pub(crate) static LOADER = {
        locales: "../locales",
        fallback_language: "en-GB",
        // Messages are written to a terminal, not embedded in bidi text.
        customise: |bundle| bundle.set_use_isolating(false),
    };
}

/// Locale used when no candidate resolves to a bundled language.
pub const FALLBACK_LOCALE: &str = FALLBACK_LITERAL;
pub(crate) const FALLBACK_LANGUAGE: LanguageIdentifier = langid!("en-GB");

/// Environment variable consulted for a locale override.
pub const LOCALE_ENV_VAR: &str = "GODOWNLOAD_LOCALE";

mod loader;
mod locales;
mod selection;

pub use loader::{Arguments, I18nError, Localizer};
pub use locales::{available_locales, match_locale, supports_locale};
pub use selection::{
    LocaleCandidates, LocaleSelection, LocaleSource, SYSTEM_LOCALE_VARS, normalise_locale,
    resolve_localizer,
};
