//! Compile-time validation of key literals.

use lokal_semantics::{KeyViolation, SegmentError, split_key};
use syn::{Error, LitStr};

/// Splits the literal into segments, or explains why it is not a key.
pub fn validate(literal: &LitStr) -> Result<Vec<String>, Error> {
    let value = literal.value();
    match split_key(&value) {
        Ok(segments) => Ok(segments.into_iter().map(str::to_string).collect()),
        Err(violation) => Err(Error::new(literal.span(), message(&value, &violation))),
    }
}

fn message(key: &str, violation: &KeyViolation) -> String {
    match violation.error {
        SegmentError::Empty => format!(
            "key \"{key}\" has an empty segment at index {}",
            violation.index
        ),
        SegmentError::InvalidChar { ch, .. } => format!(
            "key \"{key}\" has invalid character '{ch}' in segment '{}' (allowed: A-Z a-z 0-9 _ + -)",
            violation.segment
        ),
    }
}
