//! Trigger recognition: decides whether a token becomes a pill, and as what.
//!
//! Triggers come from two external sources: an ordered list of exact-match
//! shortcut strings (e.g. `/blog`) and plugin objects that expose tag
//! prefixes. The registry is an immutable snapshot captured once per render
//! pass; it is rebuilt, never mutated, when the shortcut or plugin set
//! changes. Every call into a plugin is fallible and degrades locally: a
//! plugin whose prefix accessor fails is skipped, and a failed display
//! lookup falls back to the raw token text. Recognition never aborts a
//! render pass because one plugin misbehaves.

use std::collections::BTreeSet;
use std::sync::Arc;

use thiserror::Error;
use url::Url;

use crate::tokenizer::is_delimiter;

/// Error reported by a plugin accessor.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct PluginError(pub String);

/// Capability surface of an external tag plugin.
///
/// Every method is fallible; the registry treats a failure as "no match" or
/// "fall back to the raw text" rather than surfacing it.
pub trait Plugin: Send + Sync {
    /// Tag prefixes this plugin owns (e.g. `@clip`). A prefix ending in
    /// `://` is treated as prefix-only: equality alone never completes it.
    fn prefixes(&self) -> Result<BTreeSet<String>, PluginError>;

    /// Prefixes that begin a filesystem-path tag (e.g. `@/`, `@~`, `@"`).
    fn path_prefixes(&self) -> Result<BTreeSet<String>, PluginError> {
        Ok(BTreeSet::new())
    }

    /// Short human-readable label for a raw tag this plugin owns.
    fn display_string(&self, raw_tag: &str) -> Result<String, PluginError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    Shortcut,
    ExactTag,
    UrlTag,
    PathTag,
}

/// One recognizable trigger, as captured into a registry snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    pub prefix: String,
    pub kind: TriggerKind,
    /// When set, the token converts only if a delimiter follows it;
    /// end-of-buffer does not count.
    pub requires_trailing_delimiter: bool,
    /// When set, a token that merely equals the prefix is never complete
    /// (protocol-style prefixes such as `@https://`).
    pub prefix_only: bool,
}

/// Outcome of recognizing a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recognition {
    pub kind: TriggerKind,
    /// The exact text that must reappear when the pill is expanded back to
    /// plain text.
    pub raw: String,
    /// The short label shown in the pill.
    pub display: String,
}

/// Immutable per-render-pass snapshot of the recognizable triggers.
#[derive(Clone, Default)]
pub struct TriggerRegistry {
    triggers: Vec<Trigger>,
    plugins: Vec<Arc<dyn Plugin>>,
}

impl TriggerRegistry {
    /// Capture a snapshot from the current shortcut and plugin lists.
    ///
    /// The plugin handles are retained for display lookups during the pass,
    /// so a host mutating its live plugin list afterwards does not affect
    /// recognition within the pass.
    pub fn snapshot(shortcuts: &[String], plugins: &[Arc<dyn Plugin>]) -> Self {
        let mut triggers = Vec::new();
        for shortcut in shortcuts {
            triggers.push(Trigger {
                prefix: shortcut.clone(),
                kind: TriggerKind::Shortcut,
                requires_trailing_delimiter: true,
                prefix_only: false,
            });
        }
        for plugin in plugins {
            match plugin.prefixes() {
                Ok(prefixes) => {
                    for prefix in prefixes {
                        let prefix_only = prefix.ends_with("://");
                        triggers.push(Trigger {
                            prefix,
                            kind: TriggerKind::ExactTag,
                            requires_trailing_delimiter: true,
                            prefix_only,
                        });
                    }
                }
                Err(err) => tracing::warn!("plugin prefix lookup failed: {err}"),
            }
            match plugin.path_prefixes() {
                Ok(prefixes) => {
                    for prefix in prefixes {
                        triggers.push(Trigger {
                            prefix,
                            kind: TriggerKind::PathTag,
                            requires_trailing_delimiter: true,
                            prefix_only: false,
                        });
                    }
                }
                Err(err) => tracing::warn!("plugin path prefix lookup failed: {err}"),
            }
        }
        Self {
            triggers,
            plugins: plugins.to_vec(),
        }
    }

    /// Decide whether `token` converts to a pill.
    ///
    /// `next_char` is the character immediately following the token in the
    /// source text, or `None` when the token reaches the end of the buffer.
    /// Rules are evaluated in precedence order: shortcut, exact tag, URL
    /// tag, path tag. A token satisfying none of them stays plain text.
    pub fn recognize(&self, token: &str, next_char: Option<char>) -> Option<Recognition> {
        if token.is_empty() {
            return None;
        }
        let terminated = next_char.is_some_and(is_delimiter);

        if self.triggers.iter().any(|t| {
            t.kind == TriggerKind::Shortcut
                && t.prefix == token
                && (terminated || !t.requires_trailing_delimiter)
        }) {
            return Some(Recognition {
                kind: TriggerKind::Shortcut,
                raw: token.to_string(),
                display: token.to_string(),
            });
        }

        if self.triggers.iter().any(|t| {
            t.kind == TriggerKind::ExactTag
                && !t.prefix_only
                && t.prefix == token
                && (terminated || !t.requires_trailing_delimiter)
        }) {
            return Some(Recognition {
                kind: TriggerKind::ExactTag,
                raw: token.to_string(),
                display: self.display_for(token),
            });
        }

        if terminated && is_url_tag(token) {
            return Some(Recognition {
                kind: TriggerKind::UrlTag,
                raw: token.to_string(),
                display: self.display_for(token),
            });
        }

        if self.triggers.iter().any(|t| {
            t.kind == TriggerKind::PathTag
                && token.starts_with(t.prefix.as_str())
                && (terminated || !t.requires_trailing_delimiter)
        }) {
            return Some(Recognition {
                kind: TriggerKind::PathTag,
                raw: token.to_string(),
                display: self.display_for(token),
            });
        }

        None
    }

    /// Display label for `raw_tag` from the first plugin that owns one of
    /// its prefixes. Any plugin failure falls back to the raw text so a
    /// matched tag still renders, just with a degraded label.
    fn display_for(&self, raw_tag: &str) -> String {
        for plugin in &self.plugins {
            let owns = plugin
                .prefixes()
                .map(|prefixes| prefixes.iter().any(|p| raw_tag.starts_with(p.as_str())))
                .unwrap_or(false)
                || plugin
                    .path_prefixes()
                    .map(|prefixes| prefixes.iter().any(|p| raw_tag.starts_with(p.as_str())))
                    .unwrap_or(false);
            if !owns {
                continue;
            }
            return match plugin.display_string(raw_tag) {
                Ok(display) => display,
                Err(err) => {
                    tracing::warn!("display lookup failed: {err}");
                    raw_tag.to_string()
                }
            };
        }
        raw_tag.to_string()
    }
}

/// True when the token is an `@http(s)://` tag whose remainder parses as a
/// URL with a scheme and a non-empty authority.
fn is_url_tag(token: &str) -> bool {
    let Some(rest) = token.strip_prefix('@') else {
        return false;
    };
    if !rest.starts_with("http://") && !rest.starts_with("https://") {
        return false;
    }
    match Url::parse(rest) {
        Ok(url) => url.host_str().is_some_and(|host| !host.is_empty()),
        Err(_) => false,
    }
}
