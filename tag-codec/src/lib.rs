//! Tag-aware text codec for a chat input field.
//!
//! The codec translates between two representations of the same content:
//!
//! - the *plain* text the user conceptually typed, containing raw tokens
//!   such as `@"/path/to/file.txt"`, `@https://example.com`, or `/blog`;
//! - the *rendered* buffer, where recognized tokens collapse into atomic
//!   pills that occupy exactly one position each while retaining the raw
//!   text as metadata.
//!
//! It also translates a caret offset between the two index spaces so that
//! re-rendering on every keystroke never makes the cursor jump, and it
//! extracts the in-progress token under the caret for autocomplete.
//!
//! Everything here is synchronous, stateless between calls, and total:
//! malformed input (unterminated quotes, out-of-range carets) is clamped or
//! scanned best-effort, and a misbehaving plugin degrades one label rather
//! than aborting a render pass. Serializing mutation events and capturing a
//! registry snapshot per pass are the host's responsibility.

pub mod codec;
pub mod fragment;
pub mod tokenizer;
pub mod triggers;

pub use codec::Pill;
pub use codec::Rendered;
pub use codec::RenderedBuffer;
pub use codec::Segment;
pub use codec::plain_caret;
pub use codec::render;
pub use codec::to_plain;
pub use fragment::fragment_before;
pub use fragment::token_range;
pub use tokenizer::Span;
pub use tokenizer::Token;
pub use tokenizer::is_delimiter;
pub use tokenizer::tokenize;
pub use triggers::Plugin;
pub use triggers::PluginError;
pub use triggers::Recognition;
pub use triggers::Trigger;
pub use triggers::TriggerKind;
pub use triggers::TriggerRegistry;
