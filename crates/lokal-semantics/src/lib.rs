//! Shared lokal key rules used by both the runtime and macro validation.
//!
//! This crate centralizes the key alphabet so that `key!` literals checked at
//! compile time (`lokal-macros`) and keys parsed at runtime (`lokal`) agree on
//! what a valid key is.

use std::fmt::{Display, Formatter, Result as FmtResult};

/// Separator between key segments.
pub const SEPARATOR: char = '.';

/// Returns true if `c` may appear inside a key segment (`[A-Za-z0-9_+-]`).
pub const fn is_segment_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '+' | '-')
}

/// Returns true if `c` may appear anywhere in a dotted key, separator included.
pub const fn is_key_char(c: char) -> bool {
    is_segment_char(c) || c == SEPARATOR
}

/// Why a single segment was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentError {
    /// The segment has no characters (e.g. `a..b` or a trailing `.`).
    Empty,
    /// The segment contains a character outside the key alphabet.
    InvalidChar {
        /// The offending character.
        ch: char,
        /// Byte offset of the character within the segment.
        offset: usize,
    },
}

impl Display for SegmentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            SegmentError::Empty => write!(f, "empty segment"),
            SegmentError::InvalidChar { ch, offset } => {
                write!(f, "invalid character {ch:?} at offset {offset}")
            }
        }
    }
}

/// Validates one segment against `[A-Za-z0-9_+-]+`.
pub fn validate_segment(segment: &str) -> Result<(), SegmentError> {
    if segment.is_empty() {
        return Err(SegmentError::Empty);
    }
    match segment.char_indices().find(|&(_, c)| !is_segment_char(c)) {
        Some((offset, ch)) => Err(SegmentError::InvalidChar { ch, offset }),
        None => Ok(()),
    }
}

/// A segment that failed validation inside a dotted key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyViolation {
    /// Zero-based segment position.
    pub index: usize,
    /// The segment text as written.
    pub segment: String,
    /// Byte offset of the segment within the whole key.
    pub offset: usize,
    pub error: SegmentError,
}

/// Splits a dotted key into segments, validating each one.
///
/// The empty string is the root key and yields no segments.
pub fn split_key(key: &str) -> Result<Vec<&str>, KeyViolation> {
    if key.is_empty() {
        return Ok(Vec::new());
    }
    let mut segments = Vec::new();
    let mut offset = 0;
    for (index, segment) in key.split(SEPARATOR).enumerate() {
        if let Err(error) = validate_segment(segment) {
            return Err(KeyViolation {
                index,
                segment: segment.to_string(),
                offset,
                error,
            });
        }
        segments.push(segment);
        offset += segment.len() + SEPARATOR.len_utf8();
    }
    Ok(segments)
}
