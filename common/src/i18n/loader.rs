use std::borrow::Cow;
use std::collections::HashMap;

use fluent_templates::Loader;
use thiserror::Error;

use super::locales::match_locale;
use super::{FALLBACK_LANGUAGE, FluentValue, LOADER, LanguageIdentifier};

/// Named Fluent arguments for [`Localizer::message_with_args`].
pub type Arguments<'a> = HashMap<Cow<'static, str>, FluentValue<'a>>;

/// Error raised when a message cannot be rendered.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum I18nError {
    /// No bundle defines the message, not even the fallback.
    #[error("message `{key}` missing for locale `{locale}`")]
    MissingMessage {
        /// The Fluent message identifier.
        key: String,
        /// The locale the lookup ran against.
        locale: String,
    },
}

/// Renders installer messages in one bundled language.
#[derive(Clone, Debug)]
pub struct Localizer {
    language: LanguageIdentifier,
    fallback_used: bool,
}

impl Localizer {
    /// Create a localizer for `locale`, or for
    /// [`FALLBACK_LOCALE`](super::FALLBACK_LOCALE) when the tag matches no
    /// bundle.
    ///
    /// ```
    /// use godownload_common::i18n::Localizer;
    ///
    /// let chinese = Localizer::new(Some("zh_CN.UTF-8"));
    /// assert_eq!(chinese.locale(), "zh-CN");
    /// assert!(!chinese.used_fallback());
    ///
    /// let fallback = Localizer::new(Some("zz"));
    /// assert_eq!(fallback.locale(), "en-GB");
    /// assert!(fallback.used_fallback());
    /// ```
    #[must_use]
    pub fn new(locale: Option<&str>) -> Self {
        locale
            .and_then(match_locale)
            .map_or_else(Self::fallback, |language| Self {
                language,
                fallback_used: false,
            })
    }

    /// The bundled locale in use, such as `zh-CN`.
    #[must_use]
    pub fn locale(&self) -> String {
        self.language.to_string()
    }

    /// Whether the requested locale was unavailable.
    #[must_use]
    pub const fn used_fallback(&self) -> bool {
        self.fallback_used
    }

    /// Render the message `key`.
    ///
    /// # Errors
    ///
    /// Returns [`I18nError::MissingMessage`] when no bundle defines `key`.
    pub fn message(&self, key: &str) -> Result<String, I18nError> {
        self.missing_unless(key, LOADER.try_lookup(&self.language, key))
    }

    /// Render the message `key` with named arguments.
    ///
    /// # Errors
    ///
    /// Returns [`I18nError::MissingMessage`] when no bundle defines `key`.
    pub fn message_with_args(&self, key: &str, args: &Arguments<'_>) -> Result<String, I18nError> {
        self.missing_unless(key, LOADER.try_lookup_with_args(&self.language, key, args))
    }

    fn missing_unless(&self, key: &str, rendered: Option<String>) -> Result<String, I18nError> {
        rendered.ok_or_else(|| I18nError::MissingMessage {
            key: key.to_owned(),
            locale: self.locale(),
        })
    }

    fn fallback() -> Self {
        Self {
            language: FALLBACK_LANGUAGE,
            fallback_used: true,
        }
    }
}
