//! Caret-relative token extraction for autocomplete.
//!
//! Given only a caret position in plain text, find the in-progress token
//! under or before it. The scan stops at the first delimiter outside quotes;
//! whether a position is "inside quotes" is determined by the parity of `"`
//! characters before it, so a lone open quote keeps the scan absorbing
//! delimiters all the way back to the start of the buffer. Out-of-range
//! caret positions are clamped rather than rejected, because hosts can
//! transiently report a caret beyond the buffer during rapid edits.

use crate::tokenizer::is_delimiter;

/// Clamp `offset` into `[0, text.len()]` and back to the nearest char
/// boundary at or before it.
pub(crate) fn clamp_to_char_boundary(text: &str, offset: usize) -> usize {
    let mut safe = offset.min(text.len());
    while safe > 0 && !text.is_char_boundary(safe) {
        safe -= 1;
    }
    safe
}

/// True when an odd number of `"` characters precedes byte offset `upto`.
fn inside_quotes_at(text: &str, upto: usize) -> bool {
    text[..upto].chars().filter(|ch| *ch == '"').count() % 2 == 1
}

/// The partial token strictly before the caret, for the autocomplete query.
///
/// `caret_plain_index` is a plain-space byte offset; it is clamped, never an
/// error. Scans leftward from the caret and stops at the first delimiter
/// outside quotes.
pub fn fragment_before(text: &str, caret_plain_index: usize) -> &str {
    let caret = clamp_to_char_boundary(text, caret_plain_index);
    let mut in_quotes = inside_quotes_at(text, caret);
    let mut start = caret;
    for (idx, ch) in text[..caret].char_indices().rev() {
        if ch == '"' {
            in_quotes = !in_quotes;
            start = idx;
            continue;
        }
        if is_delimiter(ch) && !in_quotes {
            break;
        }
        start = idx;
    }
    &text[start..caret]
}

/// Byte range of the whole token around the caret, for replacing a token
/// rather than just the prefix before it.
///
/// `caret_plain_index` is a plain-space byte offset; it is clamped. The
/// returned `(start, end)` has `end` exclusive. A caret surrounded by
/// delimiters yields an empty range at the caret.
pub fn token_range(text: &str, caret_plain_index: usize) -> (usize, usize) {
    let caret = clamp_to_char_boundary(text, caret_plain_index);

    let mut in_quotes = inside_quotes_at(text, caret);
    let mut start = caret;
    for (idx, ch) in text[..caret].char_indices().rev() {
        if ch == '"' {
            in_quotes = !in_quotes;
            start = idx;
            continue;
        }
        if is_delimiter(ch) && !in_quotes {
            break;
        }
        start = idx;
    }

    let mut in_quotes = inside_quotes_at(text, caret);
    let mut end = caret;
    for (idx, ch) in text[caret..].char_indices() {
        if ch == '"' {
            in_quotes = !in_quotes;
            end = caret + idx + ch.len_utf8();
            continue;
        }
        if is_delimiter(ch) && !in_quotes {
            break;
        }
        end = caret + idx + ch.len_utf8();
    }

    (start, end)
}
