//! Locale resolution for letter pages.

/// Locale every letter is expected to carry and the fallback for missing
/// translations.
pub const DEFAULT_LOCALE: &str = "en";

/// Pick the locale to display from the locales a letter exists in.
///
/// Prefers `requested`, then [`DEFAULT_LOCALE`], then whatever comes first.
/// Returns `None` only when `available` is empty.
pub fn resolve_locale<'a>(requested: Option<&str>, available: &'a [String]) -> Option<&'a str> {
    requested
        .and_then(|req| available.iter().find(|l| l.eq_ignore_ascii_case(req)))
        .or_else(|| available.iter().find(|l| l.as_str() == DEFAULT_LOCALE))
        .or_else(|| available.first())
        .map(String::as_str)
}

/// Primary language subtag of the first entry in an `Accept-Language`
/// header, e.g. `"fr-BE,fr;q=0.9,en;q=0.8"` gives `"fr"`.
pub fn from_accept_language(header: &str) -> Option<String> {
    let first = header.split(',').next()?;
    let tag = first.split(';').next()?.trim();
    let primary = tag.split(['-', '_']).next()?.trim();
    if primary.is_empty() || primary == "*" {
        return None;
    }
    Some(primary.to_ascii_lowercase())
}
