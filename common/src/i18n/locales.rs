//! Matching locale tags against the embedded bundles.
//!
//! Tags may arrive in BCP 47 form (`zh-CN`) or in the POSIX form found in
//! `LANG` (`zh_CN.UTF-8`). A tag whose region is not bundled still matches a
//! bundle for the same language, so `zh` and `zh-TW` both select `zh-CN`.

use fluent_templates::Loader;
use once_cell::sync::Lazy;

use super::{LOADER, LanguageIdentifier};

static BUNDLED: Lazy<Vec<LanguageIdentifier>> = Lazy::new(|| {
    let mut languages: Vec<LanguageIdentifier> = LOADER.locales().cloned().collect();
    languages.sort_unstable_by_key(ToString::to_string);
    languages
});

static BUNDLED_TAGS: Lazy<Vec<String>> =
    Lazy::new(|| BUNDLED.iter().map(ToString::to_string).collect());

/// Return the bundled locale tags, sorted.
#[must_use]
pub fn available_locales() -> &'static [String] {
    BUNDLED_TAGS.as_slice()
}

/// Whether `tag` selects one of the embedded bundles.
#[must_use]
pub fn supports_locale(tag: &str) -> bool {
    match_locale(tag).is_some()
}

/// Resolve `tag` to the bundled language it selects.
///
/// # Examples
///
/// ```
/// use godownload_common::i18n::match_locale;
///
/// let matched = match_locale("zh_CN.UTF-8").expect("bundled");
/// assert_eq!(matched.to_string(), "zh-CN");
/// assert_eq!(match_locale("en").map(|id| id.to_string()).as_deref(), Some("en-GB"));
/// assert!(match_locale("C").is_none());
/// ```
#[must_use]
pub fn match_locale(tag: &str) -> Option<LanguageIdentifier> {
    let requested: LanguageIdentifier = posix_to_bcp47(tag)?.parse().ok()?;
    let exact = BUNDLED.iter().find(|bundled| **bundled == requested);
    exact
        .or_else(|| {
            BUNDLED
                .iter()
                .find(|bundled| bundled.language == requested.language)
        })
        .cloned()
}

/// Strip the encoding and modifier of a POSIX locale and switch to hyphens.
///
/// Returns `None` for the `C` and `POSIX` locales, which carry no language.
fn posix_to_bcp47(tag: &str) -> Option<String> {
    let base = tag
        .split(['.', '@'])
        .next()
        .map(str::trim)
        .filter(|base| !base.is_empty())?;
    if base.eq_ignore_ascii_case("c") || base.eq_ignore_ascii_case("posix") {
        return None;
    }
    Some(base.replace('_', "-"))
}
