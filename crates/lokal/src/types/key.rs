use std::cmp::Ordering;
use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::hash::{Hash, Hasher};
use std::ops::{Range, Sub};
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use lokal_semantics::{SEPARATOR, SegmentError, split_key, validate_segment};
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use super::interner;

/// Minimum capacity allocated the first time a segment is appended.
const MIN_CAPACITY: usize = 4;

/// An error produced while building a [`Key`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// A segment is empty or contains a character outside `[A-Za-z0-9_+-]`.
    #[error("invalid key '{key}': segment {index} '{segment}': {reason}")]
    InvalidSegment {
        key: String,
        index: usize,
        segment: String,
        reason: SegmentError,
    },
}

/// A validated, dot-segmented path identifying a translation entry.
///
/// Keys compare and hash by their segment sequence, so two keys built from
/// different operations but holding the same segments are equal. The joined
/// string form is computed once per value and interned process-wide.
///
/// # Example
///
/// ```
/// use lokal::Key;
///
/// let key = Key::parse("UI.Item.Sword").unwrap();
/// let name = key.with_segment("name").unwrap();
/// assert_eq!(name.as_str(), "UI.Item.Sword.name");
/// assert_eq!(&name - 1, key);
/// ```
#[derive(Clone, Default)]
pub struct Key {
    segments: Vec<Arc<str>>,
    joined: OnceLock<Arc<str>>,
}

impl Key {
    /// The root key (no segments).
    pub fn root() -> Self {
        Self::default()
    }

    /// Parses a dotted key, validating every segment.
    ///
    /// The empty string parses to the root key.
    pub fn parse(text: &str) -> Result<Self, KeyError> {
        let segments = split_key(text).map_err(|violation| KeyError::InvalidSegment {
            key: text.to_string(),
            index: violation.index,
            segment: violation.segment,
            reason: violation.error,
        })?;
        Ok(Self {
            segments: segments.into_iter().map(Arc::from).collect(),
            joined: OnceLock::new(),
        })
    }

    /// Builds a key from segments that were already validated.
    ///
    /// Used by the `key!` macro, which checks its literal at compile time.
    #[doc(hidden)]
    pub fn from_validated_segments(segments: &[&str]) -> Self {
        Self {
            segments: segments.iter().map(|s| Arc::from(*s)).collect(),
            joined: OnceLock::new(),
        }
    }

    /// Appends a segment in place.
    pub fn push(&mut self, segment: &str) -> Result<(), KeyError> {
        self.check_segment(segment, self.segments.len())?;
        if self.segments.len() == self.segments.capacity() {
            let target = (self.segments.capacity() * 2).max(MIN_CAPACITY);
            self.segments.reserve_exact(target - self.segments.len());
        }
        self.segments.push(Arc::from(segment));
        self.joined = OnceLock::new();
        Ok(())
    }

    /// Returns a new key with `segment` appended.
    pub fn with_segment(&self, segment: &str) -> Result<Self, KeyError> {
        let mut key = self.clone();
        key.push(segment)?;
        Ok(key)
    }

    /// Returns a new key with all `extra` segments appended.
    pub fn join(&self, extra: &[&str]) -> Result<Self, KeyError> {
        let mut key = self.clone();
        for segment in extra {
            key.push(segment)?;
        }
        Ok(key)
    }

    /// Returns the key made of the segments in `range`, or `None` if the range
    /// is out of bounds.
    pub fn slice(&self, range: Range<usize>) -> Option<Self> {
        self.segments.get(range).map(|segments| Self {
            segments: segments.to_vec(),
            joined: OnceLock::new(),
        })
    }

    /// Returns the key without its last segment, or `None` for the root key.
    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            None
        } else {
            Some(self - 1)
        }
    }

    /// The last segment, if any.
    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(AsRef::as_ref)
    }

    /// Iterates over the segments in order.
    pub fn segments(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.segments.iter().map(AsRef::as_ref)
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns true for the root key.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns true if `prefix`'s segments are a leading run of this key's.
    pub fn starts_with(&self, prefix: &Key) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// The canonical dotted form, cached after the first call.
    pub fn as_str(&self) -> &str {
        self.joined.get_or_init(|| interner::intern(&self.segments))
    }

    /// The canonical dotted form as a shared string.
    pub fn to_shared(&self) -> Arc<str> {
        Arc::clone(self.joined.get_or_init(|| interner::intern(&self.segments)))
    }

    /// Appends a segment taken from an existing key or trie node.
    pub(crate) fn child(&self, segment: &Arc<str>) -> Self {
        let mut segments = Vec::with_capacity((self.segments.len() + 1).max(MIN_CAPACITY));
        segments.extend(self.segments.iter().cloned());
        segments.push(Arc::clone(segment));
        Self {
            segments,
            joined: OnceLock::new(),
        }
    }

    pub(crate) fn shared_segments(&self) -> impl ExactSizeIterator<Item = &Arc<str>> + '_ {
        self.segments.iter()
    }

    fn check_segment(&self, segment: &str, index: usize) -> Result<(), KeyError> {
        validate_segment(segment).map_err(|reason| KeyError::InvalidSegment {
            key: if self.is_root() {
                segment.to_string()
            } else {
                format!("{}{SEPARATOR}{segment}", self.as_str())
            },
            index,
            segment: segment.to_string(),
            reason,
        })
    }
}

impl Sub<usize> for &Key {
    type Output = Key;

    /// Drops the last `n` segments (saturating at the root).
    fn sub(self, n: usize) -> Key {
        let keep = self.segments.len().saturating_sub(n);
        Key {
            segments: self.segments[..keep].to_vec(),
            joined: OnceLock::new(),
        }
    }
}

impl Sub<usize> for Key {
    type Output = Key;

    fn sub(mut self, n: usize) -> Key {
        let keep = self.segments.len().saturating_sub(n);
        self.segments.truncate(keep);
        self.joined = OnceLock::new();
        self
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.segments == other.segments
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.segments.hash(state);
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        self.segments.cmp(&other.segments)
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl Debug for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "Key({:?})", self.as_str())
    }
}

impl FromStr for Key {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Key::parse(s)
    }
}

impl TryFrom<&str> for Key {
    type Error = KeyError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Key::parse(value)
    }
}

impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Key {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Key::parse(&text).map_err(DeError::custom)
    }
}
