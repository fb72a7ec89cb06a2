//! A segment-per-node map from [`Key`] to values.
//!
//! The trie answers exact lookups and "what lives under this partial key"
//! queries with one structure. Every node counts the terminal values at or
//! below it, so emptiness checks are O(1), and removal prunes branches that
//! no longer lead to a value.

mod segment;

use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::mem;
use std::sync::Arc;

use crate::types::Key;

pub use segment::{Iter, Segment};

/// A map from dotted [`Key`]s to values, organized by segment.
///
/// # Example
///
/// ```
/// use lokal::Key;
/// use lokal::trie::Trie;
///
/// let mut trie = Trie::new();
/// trie.insert(&Key::parse("UI.Item.Sword.name").unwrap(), "Sword");
/// trie.insert(&Key::parse("UI.Item.Shield.name").unwrap(), "Shield");
///
/// let items = trie.segment(&Key::parse("UI.Item").unwrap()).unwrap();
/// let names: Vec<&str> = items.first_level_keys().collect();
/// assert_eq!(names, ["Shield", "Sword"]);
/// ```
pub struct Trie<V> {
    root: Node<V>,
}

pub(crate) struct Node<V> {
    pub(crate) value: Option<V>,
    /// Terminal values at or below this node.
    pub(crate) count: usize,
    pub(crate) children: BTreeMap<Arc<str>, Node<V>>,
}

impl<V> Default for Node<V> {
    fn default() -> Self {
        Self {
            value: None,
            count: 0,
            children: BTreeMap::new(),
        }
    }
}

impl<V> Node<V> {
    fn is_dead(&self) -> bool {
        self.value.is_none() && self.children.is_empty()
    }
}

impl<V> Default for Trie<V> {
    fn default() -> Self {
        Self {
            root: Node::default(),
        }
    }
}

impl<V> Trie<V> {
    /// Create an empty trie.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.root.count
    }

    /// Returns true if no values are stored.
    pub fn is_empty(&self) -> bool {
        self.root.count == 0
    }

    /// Removes every value.
    pub fn clear(&mut self) {
        self.root = Node::default();
    }

    /// Stores `value` at `key`, returning the previous value if there was one.
    pub fn insert(&mut self, key: &Key, value: V) -> Option<V> {
        if let Some(slot) = self.get_mut(key) {
            return Some(mem::replace(slot, value));
        }

        let mut node = &mut self.root;
        node.count += 1;
        for segment in key.shared_segments() {
            node = node.children.entry(Arc::clone(segment)).or_default();
            node.count += 1;
        }
        node.value = Some(value);
        None
    }

    /// Exact-match lookup.
    pub fn get(&self, key: &Key) -> Option<&V> {
        self.node(key)?.value.as_ref()
    }

    /// Exact-match lookup returning a mutable reference.
    pub fn get_mut(&mut self, key: &Key) -> Option<&mut V> {
        let mut node = &mut self.root;
        for segment in key.segments() {
            node = node.children.get_mut(segment)?;
        }
        node.value.as_mut()
    }

    /// Returns true if a value is stored exactly at `key`.
    pub fn contains_key(&self, key: &Key) -> bool {
        self.get(key).is_some()
    }

    /// Removes the value at `key`.
    ///
    /// Counts are decremented along the whole path and any node left without
    /// a value or children is pruned from its parent, bottom-up.
    pub fn remove(&mut self, key: &Key) -> Option<V> {
        remove_at(&mut self.root, key.segments())
    }

    /// Returns a read-only view rooted at `partial`, or `None` if nothing is
    /// stored at or below it. The root key always yields a view.
    pub fn segment(&self, partial: &Key) -> Option<Segment<'_, V>> {
        let node = self.node(partial)?;
        Some(Segment::new(partial.clone(), node))
    }

    /// A view of the whole trie.
    pub fn root(&self) -> Segment<'_, V> {
        Segment::new(Key::root(), &self.root)
    }

    /// Iterates over all `(key, value)` pairs depth-first in segment order.
    pub fn iter(&self) -> Iter<'_, V> {
        self.root().iter()
    }

    /// All stored keys, depth-first.
    pub fn keys(&self) -> Vec<Key> {
        self.root().keys()
    }

    fn node(&self, key: &Key) -> Option<&Node<V>> {
        let mut node = &self.root;
        for segment in key.segments() {
            node = node.children.get(segment)?;
        }
        Some(node)
    }
}

fn remove_at<'k, V>(node: &mut Node<V>, mut path: impl Iterator<Item = &'k str>) -> Option<V> {
    let Some(segment) = path.next() else {
        let value = node.value.take()?;
        node.count -= 1;
        return Some(value);
    };

    let child = node.children.get_mut(segment)?;
    let value = remove_at(child, path)?;
    let prune = child.is_dead();
    node.count -= 1;
    if prune {
        node.children.remove(segment);
    }
    Some(value)
}

impl<V> FromIterator<(Key, V)> for Trie<V> {
    fn from_iter<T: IntoIterator<Item = (Key, V)>>(iter: T) -> Self {
        let mut trie = Trie::new();
        trie.extend(iter);
        trie
    }
}

impl<V> Extend<(Key, V)> for Trie<V> {
    fn extend<T: IntoIterator<Item = (Key, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.insert(&key, value);
        }
    }
}

impl<V: Debug> Debug for Trie<V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, V> IntoIterator for &'a Trie<V> {
    type Item = (Key, &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
