//! Preview text shown in letter listings.
//!
//! Offsets are counted in characters. The cut points are:
//!
//! 1. end at the first newline found at or after character 100 (the newline
//!    itself is excluded); with no such newline the text is cut at 99;
//! 2. if that is still longer than 500 characters, end at the first period
//!    found at or after character 300 (the period is kept); with no such
//!    period the text is cut at 300.

/// Offset from which the first newline is searched.
const NEWLINE_SEARCH_FROM: usize = 100;

/// Maximum teaser length before the second cut applies.
const MAX_TEASER_LEN: usize = 500;

/// Offset from which the first period is searched.
const PERIOD_SEARCH_FROM: usize = 300;

/// Build the listing teaser for a letter body.
pub fn teaser(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();

    let first_cut = match find_from(&chars, '\n', NEWLINE_SEARCH_FROM) {
        Some(pos) => pos,
        None => NEWLINE_SEARCH_FROM - 1,
    };
    let mut out: Vec<char> = chars[..first_cut.min(chars.len())].to_vec();

    if out.len() > MAX_TEASER_LEN {
        let second_cut = match find_from(&out, '.', PERIOD_SEARCH_FROM) {
            Some(pos) => pos + 1,
            None => PERIOD_SEARCH_FROM,
        };
        out.truncate(second_cut);
    }

    out.into_iter().collect()
}

/// Absolute position of the first `needle` at or after `from`.
fn find_from(chars: &[char], needle: char, from: usize) -> Option<usize> {
    chars
        .iter()
        .skip(from)
        .position(|&c| c == needle)
        .map(|pos| pos + from)
}
