//! Headless chat-input state machine built on the tag codec.
//!
//! The composer owns the authoritative plain text and plain-space caret,
//! and drives a full render pass after every buffer mutation:
//!
//! 1. The host reports the post-edit plain text and caret via [`Composer::update`].
//! 2. The composer captures a trigger-registry snapshot, rebuilds the
//!    rendered buffer, repositions the caret, and re-derives the plain text
//!    from the new buffer (pill expansion can insert word-boundary spaces).
//! 3. The in-progress fragment before the caret is returned so the host can
//!    feed its autocomplete popup.
//!
//! Accepting a suggestion is a buffer operation here, not a popup concern:
//! [`Composer::accept_suggestion`] closes the tag (pill plus trailing
//! space), [`Composer::accept_editable`] leaves it open for further editing
//! the way Tab-acceptance does, dropping the closing quote of a quoted tag.
//!
//! Every entry point takes `&mut self` and runs to completion, so a render
//! pass can never re-trigger itself; hosts that mirror the buffer into a
//! native text widget still need their own guard against the widget's
//! change notification re-entering [`Composer::update`].

mod config;

use std::sync::Arc;

use quill_tag_codec::Plugin;
use quill_tag_codec::Rendered;
use quill_tag_codec::TriggerRegistry;
use quill_tag_codec::fragment_before;
use quill_tag_codec::plain_caret;
use quill_tag_codec::render;
use quill_tag_codec::to_plain;
use quill_tag_codec::token_range;

pub use config::ComposerConfig;

/// Chat-input state: authoritative plain text, caret, and the latest
/// rendered pass.
#[derive(Default)]
pub struct Composer {
    plain: String,
    /// Plain-space byte offset.
    caret: usize,
    shortcuts: Vec<String>,
    plugins: Vec<Arc<dyn Plugin>>,
    rendered: Rendered,
}

impl Composer {
    pub fn new(shortcuts: Vec<String>, plugins: Vec<Arc<dyn Plugin>>) -> Self {
        let mut composer = Self {
            shortcuts,
            plugins,
            ..Self::default()
        };
        composer.refresh();
        composer
    }

    pub fn from_config(config: &ComposerConfig, plugins: Vec<Arc<dyn Plugin>>) -> Self {
        Self::new(config.shortcuts.clone(), plugins)
    }

    /// Replace the shortcut list. Takes effect on the next render pass; the
    /// registry snapshot of a pass in flight is never mutated.
    pub fn set_shortcuts(&mut self, shortcuts: Vec<String>) {
        self.shortcuts = shortcuts;
    }

    /// Replace the plugin list. Takes effect on the next render pass.
    pub fn set_plugins(&mut self, plugins: Vec<Arc<dyn Plugin>>) {
        self.plugins = plugins;
    }

    /// The authoritative plain text.
    pub fn plain_text(&self) -> &str {
        &self.plain
    }

    /// Caret as a plain-space byte offset.
    pub fn caret_plain(&self) -> usize {
        self.caret
    }

    /// The latest render pass output.
    pub fn rendered(&self) -> &Rendered {
        &self.rendered
    }

    pub fn is_empty(&self) -> bool {
        self.plain.is_empty()
    }

    /// Report the post-edit plain text and caret (plain-space byte offset),
    /// re-render, and return the fragment before the caret for autocomplete.
    pub fn update(&mut self, text: impl Into<String>, caret_plain_index: usize) -> String {
        self.plain = text.into();
        self.caret = caret_plain_index.min(self.plain.len());
        self.refresh()
    }

    /// Report a caret movement in rendered units (e.g. a click in the
    /// displayed buffer) without a text change.
    pub fn set_rendered_caret(&mut self, caret_rendered_index: usize) {
        self.caret = plain_caret(&self.rendered.buffer, caret_rendered_index);
        self.rendered.caret = caret_rendered_index.min(self.rendered.buffer.unit_len());
    }

    /// Run one render pass: rebuild the rendered buffer, reposition the
    /// caret, and re-derive the authoritative plain text from the result.
    /// Returns the in-progress fragment before the caret.
    pub fn refresh(&mut self) -> String {
        let registry = TriggerRegistry::snapshot(&self.shortcuts, &self.plugins);
        let rendered = render(&self.plain, self.caret, &registry);
        self.plain = to_plain(&rendered.buffer, false);
        self.caret = plain_caret(&rendered.buffer, rendered.caret);
        self.rendered = rendered;
        fragment_before(&self.plain, self.caret).to_string()
    }

    /// Accept an autocomplete suggestion and close the tag: the token span
    /// at the caret is replaced by `raw` plus one trailing space, so the new
    /// pill is complete immediately and the caret lands after the delimiter.
    pub fn accept_suggestion(&mut self, raw: &str) {
        let (start, end) = token_range(&self.plain, self.caret);
        let mut next = String::with_capacity(self.plain.len() + raw.len() + 1);
        next.push_str(&self.plain[..start]);
        next.push_str(raw);
        next.push(' ');
        next.push_str(&self.plain[end..]);
        self.plain = next;
        self.caret = start + raw.len() + 1;
        self.refresh();
    }

    /// Accept a suggestion but keep the tag editable: the fragment before
    /// the caret is replaced by `raw` with the closing quote of a quoted tag
    /// dropped, so the tag stays open and autocomplete can continue.
    /// Returns the new fragment.
    pub fn accept_editable(&mut self, raw: &str) -> String {
        let open = if raw.ends_with('"') && (raw.starts_with("@\"") || raw.starts_with("/\"")) {
            &raw[..raw.len() - 1]
        } else {
            raw
        };
        let fragment = fragment_before(&self.plain, self.caret);
        let start = self.caret - fragment.len();
        let mut next = String::with_capacity(self.plain.len() + open.len());
        next.push_str(&self.plain[..start]);
        next.push_str(open);
        next.push_str(&self.plain[self.caret..]);
        self.plain = next;
        self.caret = start + open.len();
        self.refresh()
    }

    /// The message text to submit: pill expansion with surrounding
    /// whitespace trimmed.
    pub fn submit_text(&self) -> String {
        to_plain(&self.rendered.buffer, true)
    }

    pub fn clear(&mut self) {
        self.plain.clear();
        self.caret = 0;
        self.refresh();
    }
}
