//! Letter creation rules shared by the repository and API layers.
//!
//! A letter is written once per locale. All locale rows created together
//! share one slug; each row's body is sanitized independently and a locale
//! whose body sanitizes to nothing is dropped rather than failing the batch.

use std::collections::HashSet;

use serde::Deserialize;

use crate::error::CoreError;
use crate::locale::DEFAULT_LOCALE;
use crate::sanitize::sanitize_html;
use crate::slug::shared_slug;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Letter type constants
// ---------------------------------------------------------------------------

/// A letter that collects signatures.
pub const TYPE_LETTER: &str = "letter";

/// An informational page: rendered like a letter, without a signature form.
pub const TYPE_INFORMATION: &str = "information";

/// All valid letter types.
pub const VALID_TYPES: &[&str] = &[TYPE_LETTER, TYPE_INFORMATION];

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// One locale variant as submitted by an author.
#[derive(Debug, Clone, Deserialize)]
pub struct LetterDraft {
    pub title: Option<String>,
    pub text: Option<String>,
    #[serde(default = "default_locale")]
    pub locale: String,
    pub image: Option<String>,
}

fn default_locale() -> String {
    DEFAULT_LOCALE.to_string()
}

/// Values applied to every locale row unless the draft already sets them.
#[derive(Debug, Clone, Default)]
pub struct LetterDefaults {
    pub user_id: Option<DbId>,
    pub letter_type: Option<String>,
    pub image: Option<String>,
    /// Argon2id PHC string. Plaintext passwords never reach this type.
    pub password_hash: Option<String>,
}

/// A locale row ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedLetter {
    pub slug: String,
    pub locale: String,
    pub title: String,
    pub text: String,
    pub image: Option<String>,
    pub letter_type: String,
    pub user_id: Option<DbId>,
    pub password_hash: Option<String>,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a letter type against the known set.
pub fn validate_type(letter_type: &str) -> Result<(), CoreError> {
    if !VALID_TYPES.contains(&letter_type) {
        return Err(CoreError::Validation(format!(
            "Invalid letter type '{}'. Valid types: {}",
            letter_type,
            VALID_TYPES.join(", ")
        )));
    }
    Ok(())
}

/// Validate a locale code: 2-10 chars of ASCII letters, digits, `-` or `_`.
pub fn validate_locale(locale: &str) -> Result<(), CoreError> {
    let valid_chars = locale
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if locale.len() < 2 || locale.len() > 10 || !valid_chars {
        return Err(CoreError::Validation(format!(
            "Invalid locale '{locale}'"
        )));
    }
    Ok(())
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// Preparation
// ---------------------------------------------------------------------------

/// Turn author drafts into insertable rows sharing one freshly generated slug.
///
/// The slug comes from the first draft's title, even if that draft is later
/// dropped. A draft whose sanitized text is blank is skipped. The returned
/// list may therefore be empty; callers decide whether that is an error.
pub fn prepare_locales(
    drafts: &[LetterDraft],
    defaults: &LetterDefaults,
) -> Result<Vec<PreparedLetter>, CoreError> {
    let first = drafts
        .first()
        .ok_or_else(|| CoreError::Validation("At least one locale is required".into()))?;
    let first_title = non_blank(&first.title)
        .ok_or_else(|| CoreError::Validation("The first locale must have a title".into()))?;

    let mut seen = HashSet::new();
    for draft in drafts {
        validate_locale(&draft.locale)?;
        if !seen.insert(draft.locale.as_str()) {
            return Err(CoreError::Validation(format!(
                "Locale '{}' appears more than once",
                draft.locale
            )));
        }
    }

    let letter_type = defaults
        .letter_type
        .clone()
        .unwrap_or_else(|| TYPE_LETTER.to_string());
    validate_type(&letter_type)?;

    let slug = shared_slug(first_title);
    let mut prepared = Vec::with_capacity(drafts.len());

    for draft in drafts {
        let text = sanitize_html(draft.text.as_deref().unwrap_or_default());
        if text.trim().is_empty() {
            tracing::warn!(locale = %draft.locale, slug = %slug, "Empty text after sanitizing, skipping locale");
            continue;
        }

        prepared.push(PreparedLetter {
            slug: slug.clone(),
            locale: draft.locale.clone(),
            title: non_blank(&draft.title).unwrap_or(first_title).to_string(),
            text,
            image: non_blank(&draft.image)
                .or_else(|| non_blank(&defaults.image))
                .map(str::to_string),
            letter_type: letter_type.clone(),
            user_id: defaults.user_id,
            password_hash: defaults.password_hash.clone(),
        });
    }

    Ok(prepared)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn draft(title: Option<&str>, locale: &str, text: &str) -> LetterDraft {
        LetterDraft {
            title: title.map(str::to_string),
            text: Some(text.to_string()),
            locale: locale.to_string(),
            image: None,
        }
    }

    #[test]
    fn empty_locale_is_dropped() {
        let drafts = vec![
            draft(Some("Stop X"), "en", "<p>hi</p>"),
            draft(None, "fr", ""),
        ];
        let rows = prepare_locales(&drafts, &LetterDefaults::default()).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].locale, "en");
        assert_eq!(rows[0].text, "<p>hi</p>");

        let (stem, suffix) = rows[0].slug.rsplit_once('-').unwrap();
        assert_eq!(stem, "stop-x");
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn locale_with_only_unsafe_markup_is_dropped() {
        let drafts = vec![
            draft(Some("Stop X"), "en", "<script>alert(1)</script>"),
            draft(Some("Arrêtez X"), "fr", "<p>salut</p>"),
        ];
        let rows = prepare_locales(&drafts, &LetterDefaults::default()).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].locale, "fr");
        assert_eq!(rows[0].title, "Arrêtez X");
        assert!(rows[0].slug.starts_with("stop-x-"));
    }

    #[test]
    fn all_locales_empty_yields_no_rows() {
        let drafts = vec![draft(Some("Stop X"), "en", "   ")];
        let rows = prepare_locales(&drafts, &LetterDefaults::default()).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn rows_share_one_slug() {
        let drafts = vec![
            draft(Some("Stop X"), "en", "<p>hi</p>"),
            draft(Some("Arrêtez X"), "fr", "<p>salut</p>"),
            draft(None, "nl", "<p>hallo</p>"),
        ];
        let rows = prepare_locales(&drafts, &LetterDefaults::default()).unwrap();

        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.slug == rows[0].slug));
        // Missing title falls back to the first one.
        assert_eq!(rows[2].title, "Stop X");
    }

    #[test]
    fn defaults_fill_only_absent_fields() {
        let mut with_image = draft(Some("Stop X"), "en", "<p>hi</p>");
        with_image.image = Some("https://example.com/own.png".into());
        let drafts = vec![with_image, draft(None, "fr", "<p>salut</p>")];
        let defaults = LetterDefaults {
            user_id: Some(4),
            letter_type: Some(TYPE_INFORMATION.into()),
            image: Some("https://example.com/default.png".into()),
            password_hash: Some("$argon2id$stub".into()),
        };

        let rows = prepare_locales(&drafts, &defaults).unwrap();

        assert_eq!(rows[0].image.as_deref(), Some("https://example.com/own.png"));
        assert_eq!(rows[1].image.as_deref(), Some("https://example.com/default.png"));
        assert!(rows.iter().all(|r| r.user_id == Some(4)));
        assert!(rows.iter().all(|r| r.letter_type == TYPE_INFORMATION));
        assert!(rows.iter().all(|r| r.password_hash.as_deref() == Some("$argon2id$stub")));
    }

    #[test]
    fn first_title_is_required() {
        let drafts = vec![draft(Some("  "), "en", "<p>hi</p>")];
        assert_matches!(
            prepare_locales(&drafts, &LetterDefaults::default()),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            prepare_locales(&[], &LetterDefaults::default()),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn duplicate_locales_are_rejected() {
        let drafts = vec![
            draft(Some("Stop X"), "en", "<p>hi</p>"),
            draft(Some("Stop X again"), "en", "<p>hi</p>"),
        ];
        assert_matches!(
            prepare_locales(&drafts, &LetterDefaults::default()),
            Err(CoreError::Validation(msg)) if msg.contains("more than once")
        );
    }

    #[test]
    fn unknown_type_is_rejected() {
        let drafts = vec![draft(Some("Stop X"), "en", "<p>hi</p>")];
        let defaults = LetterDefaults {
            letter_type: Some("poll".into()),
            ..Default::default()
        };
        assert_matches!(
            prepare_locales(&drafts, &defaults),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn locale_codes_are_validated() {
        assert!(validate_locale("en").is_ok());
        assert!(validate_locale("pt-BR").is_ok());
        assert!(validate_locale("e").is_err());
        assert!(validate_locale("en'; --").is_err());
    }
}
