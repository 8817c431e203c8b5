//! Text helpers for generated poems.

use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum number of characters returned by the poem endpoint.
pub const MAX_RESPONSE_CHARS: usize = 1000;

/// Matches an enumeration marker such as `12.` at the start of a line.
static ENUMERATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*[0-9]+\.[ \t]*").expect("enumeration pattern is valid")
});

/// Remove `<number>.` enumeration artifacts that the model emits at the start
/// of lines, e.g. `"1. Roses"` becomes `"Roses"`.
///
/// Numbers elsewhere in a line are left alone.
#[must_use]
pub fn strip_enumeration(text: &str) -> String {
    ENUMERATION.replace_all(text, "").into_owned()
}

/// Return the prefix of `text` holding at most `max_chars` characters.
///
/// Counts Unicode scalar values, so the cut never splits a code point.
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_offset, _)) => &text[..byte_offset],
        None => text,
    }
}
