use crate::trie::Node;
use crate::types::Key;

/// A read-only view of the subtree rooted at a partial key.
///
/// Views borrow the trie; enumerating children does not copy the subtree.
pub struct Segment<'a, V> {
    key: Key,
    node: &'a Node<V>,
}

impl<'a, V> Segment<'a, V> {
    pub(crate) fn new(key: Key, node: &'a Node<V>) -> Self {
        Self { key, node }
    }

    /// The key this view is rooted at.
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// The value stored exactly at this key, if any.
    pub fn value(&self) -> Option<&'a V> {
        self.node.value.as_ref()
    }

    /// Returns true if a value is stored exactly at this key.
    pub fn is_terminal(&self) -> bool {
        self.node.value.is_some()
    }

    /// Number of values at or below this key.
    pub fn len(&self) -> usize {
        self.node.count
    }

    /// Returns true if nothing is stored at or below this key.
    pub fn is_empty(&self) -> bool {
        self.node.count == 0
    }

    /// Names of the immediate children, in segment order.
    pub fn first_level_keys(&self) -> impl Iterator<Item = &'a str> + use<'a, V> {
        self.node.children.keys().map(AsRef::as_ref)
    }

    /// The view of one immediate child.
    pub fn child(&self, name: &str) -> Option<Segment<'a, V>> {
        let (segment, node) = self.node.children.get_key_value(name)?;
        Some(Segment::new(self.key.child(segment), node))
    }

    /// Views of all immediate children, in segment order.
    pub fn children(&self) -> impl Iterator<Item = Segment<'a, V>> + '_ {
        self.node
            .children
            .iter()
            .map(|(segment, node)| Segment::new(self.key.child(segment), node))
    }

    /// All keys holding a value at or below this view, depth-first.
    pub fn keys(&self) -> Vec<Key> {
        self.iter().map(|(key, _)| key).collect()
    }

    /// Iterates over `(key, value)` pairs at or below this view, depth-first.
    pub fn iter(&self) -> Iter<'a, V> {
        Iter {
            stack: vec![(self.key.clone(), self.node)],
            remaining: self.node.count,
        }
    }
}

/// Depth-first iterator over the values of a [`Segment`].
pub struct Iter<'a, V> {
    stack: Vec<(Key, &'a Node<V>)>,
    remaining: usize,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (Key, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((key, node)) = self.stack.pop() {
            for (segment, child) in node.children.iter().rev() {
                self.stack.push((key.child(segment), child));
            }
            if let Some(value) = &node.value {
                self.remaining -= 1;
                return Some((key, value));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}
