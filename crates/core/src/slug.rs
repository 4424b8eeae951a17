//! Slug generation for letters.
//!
//! Every locale variant of a letter shares one slug: a readable stem derived
//! from the first title plus a random hex suffix so two letters with the
//! same title never collide.

use rand::Rng;

/// Characters removed outright (not replaced by a hyphen).
const REMOVED_CHARS: &[char] = &['*', '+', '~', '.', '(', ')', '\'', '"', '!', ':', '@', '#', ','];

/// Stem used when a title has no ASCII alphanumerics at all.
const FALLBACK_STEM: &str = "letter";

/// Length of the random hex suffix.
pub const SUFFIX_LENGTH: usize = 8;

/// Generate a URL-safe stem from a title.
///
/// Lowercases, drops the punctuation in [`REMOVED_CHARS`], maps every other
/// non-alphanumeric run to a single hyphen and trims leading/trailing
/// hyphens.
pub fn generate_slug(title: &str) -> String {
    let mut result = String::with_capacity(title.len());
    let mut prev_hyphen = false;

    for c in title.to_lowercase().chars() {
        if REMOVED_CHARS.contains(&c) {
            continue;
        }
        if c.is_ascii_alphanumeric() {
            result.push(c);
            prev_hyphen = false;
        } else if !prev_hyphen {
            result.push('-');
            prev_hyphen = true;
        }
    }

    let trimmed = result.trim_matches('-');
    if trimmed.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Random lowercase hex suffix of [`SUFFIX_LENGTH`] characters.
pub fn random_suffix() -> String {
    format!("{:08x}", rand::rng().random::<u32>())
}

/// The slug shared by all locale rows created together: `{stem}-{suffix}`.
pub fn shared_slug(title: &str) -> String {
    format!("{}-{}", generate_slug(title), random_suffix())
}
