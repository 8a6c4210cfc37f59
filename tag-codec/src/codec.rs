//! Bidirectional translation between plain text and the pill-collapsed
//! rendered buffer, including caret mapping between the two index spaces.
//!
//! Index conventions:
//!
//! - *Plain space* is byte offsets into the UTF-8 plain text. Offsets are
//!   clamped to char boundaries; an out-of-range offset is never an error.
//! - *Rendered space* is element units: each char of a plain run counts as
//!   one unit, and each pill counts as exactly one unit regardless of the
//!   length of its raw text.
//!
//! [`render`] maps plain → rendered, [`to_plain`] expands pills back to
//! their raw text, and [`plain_caret`] maps a rendered-space caret back to
//! the plain offset in the text [`to_plain`] produces. Every function is a
//! pure function of its inputs and always produces some valid output, even
//! for malformed input (stray quotes, zero-length tokens, wild carets).

use serde::Deserialize;
use serde::Serialize;

use crate::fragment::clamp_to_char_boundary;
use crate::tokenizer::Span;
use crate::tokenizer::is_delimiter;
use crate::tokenizer::tokenize;
use crate::triggers::TriggerRegistry;

/// An atomic rendered unit standing in for a recognized token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pill {
    /// The exact underlying text that reappears when the buffer is
    /// converted back to plain text.
    pub raw: String,
    /// The short label shown to the user.
    pub display: String,
}

/// One segment of the rendered buffer: a plain character run or a pill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Segment {
    Text { text: String },
    Pill { pill: Pill },
}

/// The displayed form of the input: plain runs interleaved with pills.
///
/// Rebuilt from the plain text on every change; never edited in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedBuffer {
    segments: Vec<Segment>,
}

impl RenderedBuffer {
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Total length in rendered units.
    pub fn unit_len(&self) -> usize {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Text { text } => text.chars().count(),
                Segment::Pill { .. } => 1,
            })
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The pills currently in the buffer, in order.
    pub fn pills(&self) -> impl Iterator<Item = &Pill> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Pill { pill } => Some(pill),
            Segment::Text { .. } => None,
        })
    }

    fn push_text(&mut self, chunk: &str) {
        if chunk.is_empty() {
            return;
        }
        // Adjacent plain runs coalesce; pills always stand alone.
        if let Some(Segment::Text { text }) = self.segments.last_mut() {
            text.push_str(chunk);
        } else {
            self.segments.push(Segment::Text {
                text: chunk.to_string(),
            });
        }
    }

    fn push_pill(&mut self, pill: Pill) {
        self.segments.push(Segment::Pill { pill });
    }
}

/// Output of one render pass: the rebuilt buffer and the caret repositioned
/// into rendered space.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rendered {
    pub buffer: RenderedBuffer,
    /// Caret offset in rendered units, clamped to the buffer length.
    pub caret: usize,
}

/// Rebuild the rendered buffer from `text` and translate the caret.
///
/// `caret_plain_index` is a plain-space byte offset (clamped). The caret is
/// latched by the first span that claims it and later matches never
/// override it:
///
/// - after a delimiter, when the caret sits exactly past that delimiter;
/// - anywhere on a recognized token, pushed to the pill's right edge (the
///   caret never lands inside a pill);
/// - inside an unrecognized token, at the exact proportional position.
///
/// A caret at or beyond the end of the buffer maps to the final rendered
/// length.
pub fn render(text: &str, caret_plain_index: usize, registry: &TriggerRegistry) -> Rendered {
    let caret_plain = clamp_to_char_boundary(text, caret_plain_index);
    let mut buffer = RenderedBuffer::default();
    let mut units = 0usize;
    let mut caret: Option<usize> = None;

    for span in tokenize(text) {
        match span {
            Span::Delimiter { ch, start } => {
                let mut delim = [0u8; 4];
                buffer.push_text(ch.encode_utf8(&mut delim));
                units += 1;
                if caret.is_none() && caret_plain == start + ch.len_utf8() {
                    caret = Some(units);
                }
            }
            Span::Token(token) => {
                let next_char = text[token.end..].chars().next();
                let on_token = (token.start..=token.end).contains(&caret_plain);
                match registry.recognize(token.text, next_char) {
                    Some(recognition) => {
                        buffer.push_pill(Pill {
                            raw: recognition.raw,
                            display: recognition.display,
                        });
                        units += 1;
                        if caret.is_none() && on_token {
                            // Right edge of the pill; pills are atomic.
                            caret = Some(units);
                        }
                    }
                    None => {
                        let before = units;
                        buffer.push_text(token.text);
                        units += token.text.chars().count();
                        if caret.is_none() && on_token {
                            let into = text[token.start..caret_plain].chars().count();
                            caret = Some(before + into);
                        }
                    }
                }
            }
        }
    }

    let caret = caret.unwrap_or(units).min(units);
    Rendered { buffer, caret }
}

/// True when the pill at `index` needs a space inserted after its expansion
/// to keep it delimited from what follows.
fn needs_trailing_space(segments: &[Segment], index: usize) -> bool {
    match segments.get(index + 1) {
        None => false,
        Some(Segment::Pill { .. }) => true,
        Some(Segment::Text { text }) => !text.chars().next().is_some_and(is_delimiter),
    }
}

/// Expand the rendered buffer back to plain text.
///
/// Plain runs are copied verbatim. Each pill expands to its raw text, with
/// a single space inserted before when the preceding emitted character is
/// not a delimiter, and after when the next rendered element exists and is
/// not a delimiter, so adjacent pills stay unambiguously re-tokenizable.
/// `strip_ends` trims surrounding whitespace from the result; use it when
/// extracting a message to submit, not when re-deriving the plain text for
/// the next render pass.
pub fn to_plain(buffer: &RenderedBuffer, strip_ends: bool) -> String {
    let segments = buffer.segments();
    let mut out = String::new();
    for (index, segment) in segments.iter().enumerate() {
        match segment {
            Segment::Text { text } => out.push_str(text),
            Segment::Pill { pill } => {
                if !out.is_empty() && !out.chars().next_back().is_some_and(is_delimiter) {
                    out.push(' ');
                }
                out.push_str(&pill.raw);
                if needs_trailing_space(segments, index) {
                    out.push(' ');
                }
            }
        }
    }
    if strip_ends {
        out.trim().to_string()
    } else {
        out
    }
}

/// Map a rendered-space caret back to a plain-space byte offset.
///
/// The returned offset points into the text [`to_plain`] (with
/// `strip_ends = false`) produces for the same buffer, including the
/// word-boundary spaces inserted around pill expansions. A caret at a
/// pill's left edge maps to just before its expansion; a caret at its
/// right edge maps to just after the raw text (before any inserted
/// trailing space). A caret at or beyond the end maps to the full length.
pub fn plain_caret(buffer: &RenderedBuffer, caret_rendered_index: usize) -> usize {
    if caret_rendered_index == 0 {
        return 0;
    }
    let segments = buffer.segments();
    let mut plain = 0usize;
    let mut units = 0usize;
    let mut last: Option<char> = None;
    for (index, segment) in segments.iter().enumerate() {
        match segment {
            Segment::Text { text } => {
                for ch in text.chars() {
                    plain += ch.len_utf8();
                    units += 1;
                    last = Some(ch);
                    if units == caret_rendered_index {
                        return plain;
                    }
                }
            }
            Segment::Pill { pill } => {
                if plain > 0 && !last.is_some_and(is_delimiter) {
                    plain += 1;
                    last = Some(' ');
                }
                plain += pill.raw.len();
                units += 1;
                last = pill.raw.chars().next_back().or(last);
                if units == caret_rendered_index {
                    return plain;
                }
                if needs_trailing_space(segments, index) {
                    plain += 1;
                    last = Some(' ');
                }
            }
        }
    }
    plain
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::triggers::Plugin;
    use crate::triggers::PluginError;

    struct FilePlugin;

    impl Plugin for FilePlugin {
        fn prefixes(&self) -> Result<BTreeSet<String>, PluginError> {
            Ok(["@clip", "@https://", "@http://"]
                .iter()
                .map(|p| p.to_string())
                .collect())
        }

        fn path_prefixes(&self) -> Result<BTreeSet<String>, PluginError> {
            Ok(["@/", "@~", "@\""].iter().map(|p| p.to_string()).collect())
        }

        fn display_string(&self, raw_tag: &str) -> Result<String, PluginError> {
            // Label a path tag by its file name, like the file plugin does.
            let trimmed = raw_tag
                .trim_start_matches('@')
                .trim_matches('"')
                .trim_end_matches('/');
            Ok(trimmed.rsplit('/').next().unwrap_or(trimmed).to_string())
        }
    }

    fn registry() -> TriggerRegistry {
        let plugin: Arc<dyn Plugin> = Arc::new(FilePlugin);
        TriggerRegistry::snapshot(&["/blog".to_string()], &[plugin])
    }

    fn pills_of(buffer: &RenderedBuffer) -> Vec<String> {
        buffer.pills().map(|pill| pill.raw.clone()).collect()
    }

    #[test]
    fn quoted_path_tag_becomes_one_pill() {
        let text = "@\"/tmp/a.txt\" ";
        let rendered = render(text, text.len(), &registry());
        assert_eq!(pills_of(&rendered.buffer), vec!["@\"/tmp/a.txt\"".to_string()]);
        assert_eq!(rendered.buffer.unit_len(), 2);
        assert_eq!(rendered.caret, 2);
        assert_eq!(
            rendered.buffer.segments(),
            &[
                Segment::Pill {
                    pill: Pill {
                        raw: "@\"/tmp/a.txt\"".to_string(),
                        display: "a.txt".to_string(),
                    }
                },
                Segment::Text {
                    text: " ".to_string()
                },
            ]
        );
    }

    #[test]
    fn url_without_trailing_delimiter_stays_plain() {
        let text = "@http://example.com";
        let rendered = render(text, text.len(), &registry());
        assert_eq!(pills_of(&rendered.buffer), Vec::<String>::new());
        assert_eq!(
            rendered.buffer.segments(),
            &[Segment::Text {
                text: text.to_string()
            }]
        );
        assert_eq!(rendered.caret, text.chars().count());
    }

    #[test]
    fn shortcut_round_trips_through_plain() {
        let rendered = render("/blog hello", 0, &registry());
        assert_eq!(pills_of(&rendered.buffer), vec!["/blog".to_string()]);
        assert_eq!(to_plain(&rendered.buffer, false), "/blog hello");
    }

    #[test]
    fn adjacent_pills_expand_space_separated() {
        let mut buffer = RenderedBuffer::default();
        buffer.push_pill(Pill {
            raw: "@\"/tmp/a b.txt\"".to_string(),
            display: "a b.txt".to_string(),
        });
        buffer.push_pill(Pill {
            raw: "/blog".to_string(),
            display: "/blog".to_string(),
        });
        assert_eq!(to_plain(&buffer, false), "@\"/tmp/a b.txt\" /blog");
    }

    #[test]
    fn round_trip_preserves_recognized_text() {
        let text = "/blog @\"/tmp/a.txt\" check @https://example.com out\n";
        let rendered = render(text, 0, &registry());
        assert_eq!(to_plain(&rendered.buffer, false), text);
    }

    #[test]
    fn rerender_of_expanded_plain_is_idempotent() {
        let text = "/blog @/etc/hosts done ";
        let first = render(text, text.len(), &registry());
        let expanded = to_plain(&first.buffer, false);
        let second = render(&expanded, expanded.len(), &registry());
        assert_eq!(pills_of(&first.buffer), pills_of(&second.buffer));
        assert_eq!(first.buffer, second.buffer);
    }

    #[test]
    fn strip_ends_trims_for_submission() {
        let rendered = render("  /blog hi \n", 0, &registry());
        assert_eq!(to_plain(&rendered.buffer, true), "/blog hi");
    }

    #[test]
    fn caret_is_monotonic_in_plain_offset() {
        let text = "/blog @\"/tmp/a b.txt\" tail";
        let reg = registry();
        let mut last = 0;
        for offset in 0..=text.len() {
            let rendered = render(text, offset, &reg);
            assert!(rendered.caret >= last, "caret regressed at offset {offset}");
            last = rendered.caret;
        }
    }

    #[test]
    fn caret_inside_recognized_token_lands_after_pill() {
        // "/blog hello": the pill is unit 0, so every caret on the token
        // maps to its right edge, unit 1.
        let reg = registry();
        for offset in 0..=5 {
            let rendered = render("/blog hello", offset, &reg);
            assert_eq!(rendered.caret, 1, "offset {offset}");
        }
    }

    #[test]
    fn caret_after_delimiter_follows_it() {
        let rendered = render("/blog hello", 6, &registry());
        assert_eq!(rendered.caret, 2);
    }

    #[test]
    fn caret_inside_plain_token_is_proportional() {
        let rendered = render("hello world", 8, &registry());
        assert_eq!(rendered.caret, 8);
    }

    #[test]
    fn caret_beyond_end_clamps_to_rendered_length() {
        let rendered = render("/blog ", 1000, &registry());
        assert_eq!(rendered.caret, rendered.buffer.unit_len());
    }

    #[test]
    fn caret_on_multibyte_text_counts_units_not_bytes() {
        let text = "héllo wörld";
        let rendered = render(text, text.len(), &registry());
        assert_eq!(rendered.caret, 11);
        // Mid-char offsets clamp back to the previous boundary.
        let rendered = render(text, 2, &registry());
        assert_eq!(rendered.caret, 1);
    }

    #[test]
    fn stray_quotes_still_render() {
        let rendered = render("say \"half quoted", 16, &registry());
        assert_eq!(to_plain(&rendered.buffer, false), "say \"half quoted");
        assert_eq!(rendered.caret, 16);
    }

    #[test]
    fn plain_caret_walks_text_runs() {
        let rendered = render("hello world", 0, &registry());
        assert_eq!(plain_caret(&rendered.buffer, 0), 0);
        assert_eq!(plain_caret(&rendered.buffer, 4), 4);
        assert_eq!(plain_caret(&rendered.buffer, 11), 11);
        assert_eq!(plain_caret(&rendered.buffer, 99), 11);
    }

    #[test]
    fn plain_caret_expands_pills() {
        let rendered = render("/blog hello", 0, &registry());
        // Unit 1 is the pill's right edge: after "/blog".
        assert_eq!(plain_caret(&rendered.buffer, 1), 5);
        assert_eq!(plain_caret(&rendered.buffer, 2), 6);
    }

    #[test]
    fn plain_caret_counts_inserted_pill_spaces() {
        let mut buffer = RenderedBuffer::default();
        buffer.push_pill(Pill {
            raw: "@a".to_string(),
            display: "a".to_string(),
        });
        buffer.push_pill(Pill {
            raw: "@b".to_string(),
            display: "b".to_string(),
        });
        assert_eq!(to_plain(&buffer, false), "@a @b");
        assert_eq!(plain_caret(&buffer, 0), 0);
        assert_eq!(plain_caret(&buffer, 1), 2);
        assert_eq!(plain_caret(&buffer, 2), 5);
    }

    #[test]
    fn plain_caret_inverts_render_caret() {
        let text = "/blog @\"/tmp/a.txt\" tail ";
        let reg = registry();
        for offset in [0, 6, 19, 20, 24, 25] {
            let rendered = render(text, offset, &reg);
            let plain = plain_caret(&rendered.buffer, rendered.caret);
            let again = render(text, plain, &reg);
            assert_eq!(again.caret, rendered.caret, "offset {offset}");
        }
    }

    #[test]
    fn rendered_buffer_serializes() {
        let rendered = render("/blog hi", 0, &registry());
        let json = serde_json::to_string(&rendered.buffer);
        assert!(json.is_ok());
    }
}
