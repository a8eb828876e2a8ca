//! Shared infrastructure for the godownload installer.
//!
//! At present this crate carries the Fluent-backed localisation layer used to
//! render progress and diagnostic messages in the user's language.

pub mod i18n;

pub use i18n::{
    Arguments, FALLBACK_LOCALE, FluentValue, I18nError, LocaleCandidates, LocaleSelection,
    LocaleSource, Localizer, available_locales, normalise_locale, resolve_localizer,
    supports_locale,
};
