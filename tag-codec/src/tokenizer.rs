//! Quote-aware scanner that splits plain input text into delimiter and token
//! spans.
//!
//! The scanner is a single left-to-right pass and holds no state across
//! calls. Delimiters (space, newline, tab) are emitted one per span. A `"`
//! toggles an inside-quotes flag, and delimiters inside quotes are absorbed
//! into the surrounding token. A token that starts with `@"` is scanned
//! specially: it consumes through the matching close quote (inclusive) and
//! ends there, even when the next character is not a delimiter. Unterminated
//! quotes are not an error; the token simply runs to the end of the buffer.

/// True for the characters that end a token outside quotes.
pub fn is_delimiter(ch: char) -> bool {
    matches!(ch, ' ' | '\n' | '\t')
}

/// A maximal run of non-delimiter characters.
///
/// `start`/`end` are byte offsets into the scanned text, with `end`
/// exclusive, so `text[start..end] == self.text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
}

/// One span of the scanned text: either a single delimiter character or a
/// token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Span<'a> {
    /// A single delimiter character at byte offset `start`.
    Delimiter { ch: char, start: usize },
    Token(Token<'a>),
}

impl Span<'_> {
    pub fn is_delimiter(&self) -> bool {
        matches!(self, Span::Delimiter { .. })
    }
}

/// Split `text` into delimiter and token spans.
///
/// The returned spans cover the input exactly, in order, with no gaps.
pub fn tokenize(text: &str) -> Vec<Span<'_>> {
    let mut spans = Vec::new();
    let mut index = 0;
    while index < text.len() {
        let Some(ch) = text[index..].chars().next() else {
            break;
        };
        if is_delimiter(ch) {
            spans.push(Span::Delimiter { ch, start: index });
            index += ch.len_utf8();
            continue;
        }
        let start = index;
        if text[index..].starts_with("@\"") {
            // Quoted tag token: consume through the matching close quote, or
            // to the end of the buffer when unterminated.
            index += 2;
            match text[index..].find('"') {
                Some(rel) => index += rel + 1,
                None => index = text.len(),
            }
        } else {
            let mut in_quotes = false;
            while index < text.len() {
                let Some(next) = text[index..].chars().next() else {
                    break;
                };
                if next == '"' {
                    in_quotes = !in_quotes;
                } else if is_delimiter(next) && !in_quotes {
                    break;
                }
                index += next.len_utf8();
            }
        }
        spans.push(Span::Token(Token {
            text: &text[start..index],
            start,
            end: index,
        }));
    }
    spans
}
