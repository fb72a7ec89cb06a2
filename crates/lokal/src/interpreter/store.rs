//! Trie-backed translation dictionary.

use std::sync::OnceLock;

use tracing::debug;

use crate::interpreter::diagnostics::{LoadError, compute_suggestions};
use crate::trie::{Segment, Trie};
use crate::types::{Key, palette_hex};

/// A translated string and its lazily normalized form.
#[derive(Debug, Clone, Default)]
pub struct TranslationEntry {
    text: String,
    color_replaced: OnceLock<String>,
}

impl TranslationEntry {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color_replaced: OnceLock::new(),
        }
    }

    /// The text as loaded.
    pub fn raw(&self) -> &str {
        &self.text
    }

    /// The text with `<color=X>` palette letters rewritten to hex, computed
    /// on first access.
    pub fn text(&self) -> &str {
        self.color_replaced
            .get_or_init(|| normalize_colors(&self.text))
    }

    /// Returns true once [`text`](Self::text) has been computed.
    pub fn is_normalized(&self) -> bool {
        self.color_replaced.get().is_some()
    }

    pub fn into_raw(self) -> String {
        self.text
    }
}

impl PartialEq for TranslationEntry {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

const COLOR_OPEN: &str = "<color=";

/// Rewrites `<color=R>` to `<color=#FF0000>` for every palette letter.
///
/// ```
/// use lokal::interpreter::normalize_colors;
///
/// assert_eq!(normalize_colors("<color=R>hot</color>"), "<color=#FF0000>hot</color>");
/// assert_eq!(normalize_colors("<color=Z>?</color>"), "<color=Z>?</color>");
/// ```
pub fn normalize_colors(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(at) = rest.find(COLOR_OPEN) {
        let after = &rest[at + COLOR_OPEN.len()..];
        out.push_str(&rest[..at + COLOR_OPEN.len()]);

        let mut chars = after.chars();
        let replacement = match (chars.next(), chars.next()) {
            (Some(letter), Some('>')) => palette_hex(letter).map(|hex| (hex, letter.len_utf8())),
            _ => None,
        };
        rest = match replacement {
            Some((hex, len)) => {
                out.push_str(hex);
                &after[len..]
            }
            None => after,
        };
    }
    out.push_str(rest);
    out
}

/// Translations keyed by [`Key`], browsable by partial key.
///
/// # Example
///
/// ```
/// use lokal::{Key, TranslationStore};
///
/// let mut store = TranslationStore::new();
/// store
///     .load([("UI.Item.Sword.name", "Sword"), ("UI.Item.Shield.name", "Shield")])
///     .unwrap();
///
/// assert_eq!(store.get(&Key::parse("UI.Item.Sword.name").unwrap()), Some("Sword"));
/// assert_eq!(store.options("UI.Item.S"), ["Shield", "Sword"]);
/// ```
#[derive(Debug, Default)]
pub struct TranslationStore {
    entries: Trie<TranslationEntry>,
}

impl TranslationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from flat `(key, text)` pairs.
    pub fn from_pairs<I, K, T>(pairs: I) -> Result<Self, LoadError>
    where
        I: IntoIterator<Item = (K, T)>,
        K: AsRef<str>,
        T: Into<String>,
    {
        let mut store = Self::new();
        store.load(pairs)?;
        Ok(store)
    }

    /// Replaces every entry with `pairs`, returning the number of entries.
    ///
    /// On error the store is left unchanged. Later duplicates win.
    pub fn load<I, K, T>(&mut self, pairs: I) -> Result<usize, LoadError>
    where
        I: IntoIterator<Item = (K, T)>,
        K: AsRef<str>,
        T: Into<String>,
    {
        let mut entries = Trie::new();
        for (key, text) in pairs {
            let key = key.as_ref();
            let parsed = Key::parse(key).map_err(|source| LoadError::InvalidKey {
                key: key.to_string(),
                source,
            })?;
            entries.insert(&parsed, TranslationEntry::new(text));
        }
        self.entries = entries;
        debug!(entries = self.entries.len(), "loaded translations");
        Ok(self.entries.len())
    }

    /// Sets the text of one key, returning the previous raw text.
    pub fn insert(&mut self, key: &Key, text: impl Into<String>) -> Option<String> {
        self.entries
            .insert(key, TranslationEntry::new(text))
            .map(TranslationEntry::into_raw)
    }

    /// Removes one key, returning its raw text.
    pub fn remove(&mut self, key: &Key) -> Option<String> {
        self.entries.remove(key).map(TranslationEntry::into_raw)
    }

    /// The normalized text of a key.
    pub fn get(&self, key: &Key) -> Option<&str> {
        self.entries.get(key).map(TranslationEntry::text)
    }

    /// The text of a key as loaded.
    pub fn raw(&self, key: &Key) -> Option<&str> {
        self.entries.get(key).map(TranslationEntry::raw)
    }

    pub fn entry(&self, key: &Key) -> Option<&TranslationEntry> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &Key) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The subtree below a partial key.
    pub fn segment(&self, partial: &Key) -> Option<Segment<'_, TranslationEntry>> {
        self.entries.segment(partial)
    }

    /// Every key at or below `partial`, depth first.
    pub fn lookup(&self, partial: &Key) -> Vec<Key> {
        self.entries
            .segment(partial)
            .map(|segment| segment.keys())
            .unwrap_or_default()
    }

    /// Completions for a partially typed key.
    ///
    /// Everything up to the last `.` must name an existing path; the text
    /// after it filters that path's children by prefix. Returns the matching
    /// child segment names in order.
    pub fn options(&self, partial: &str) -> Vec<String> {
        let (path, typed) = match partial.rsplit_once('.') {
            Some((path, typed)) => (path, typed),
            None => ("", partial),
        };
        let Ok(path) = Key::parse(path) else {
            return Vec::new();
        };
        let Some(segment) = self.entries.segment(&path) else {
            return Vec::new();
        };
        segment
            .first_level_keys()
            .filter(|name| name.starts_with(typed))
            .map(str::to_string)
            .collect()
    }

    /// Existing keys that look like a misspelling of `key`: siblings whose
    /// last segment is close to the last segment of `key`.
    pub fn suggestions(&self, key: &Key) -> Vec<Key> {
        let (Some(parent), Some(last)) = (key.parent(), key.last()) else {
            return Vec::new();
        };
        let Some(segment) = self.entries.segment(&parent) else {
            return Vec::new();
        };
        let siblings: Vec<&str> = segment
            .first_level_keys()
            .filter(|name| segment.child(name).is_some_and(|child| child.is_terminal()))
            .collect();
        compute_suggestions(last, &siblings)
            .iter()
            .filter_map(|name| parent.with_segment(name).ok())
            .collect()
    }

    /// "key not found" text for `key`, naming close siblings if any.
    pub(crate) fn missing_key_message(&self, key: &Key) -> String {
        let suggestions = self.suggestions(key);
        if suggestions.is_empty() {
            format!("key '{key}' not found")
        } else {
            let names: Vec<&str> = suggestions.iter().map(Key::as_str).collect();
            format!("key '{key}' not found; did you mean: {}", names.join(", "))
        }
    }

    /// All keys with their entries, depth first.
    pub fn iter(&self) -> impl Iterator<Item = (Key, &TranslationEntry)> + '_ {
        self.entries.iter()
    }

    pub fn keys(&self) -> Vec<Key> {
        self.entries.keys()
    }
}
