//! Loading JSON dictionaries into flat `(key, text)` pairs.
//!
//! A dictionary is a JSON object whose leaves are strings. Nested objects
//! are flattened with `.`, so `{"UI": {"title": "Menu"}}` yields the entry
//! `UI.title`. Numbers and booleans are kept as their JSON text.

use std::fs::read_to_string;
use std::path::Path;

use miette::{Diagnostic, NamedSource, SourceSpan};
use serde_json::{Map, Value as Json};
use thiserror::Error;

use lokal::TranslationStore;

/// Errors in the shape of a dictionary file.
#[derive(Debug, Error, Diagnostic)]
pub enum DictionaryError {
    #[error("cannot read dictionary '{path}': {message}")]
    #[diagnostic(code(lokal::dictionary::io))]
    Io { path: String, message: String },

    #[error("invalid JSON: {message}")]
    #[diagnostic(code(lokal::dictionary::json))]
    Json {
        #[source_code]
        src: NamedSource<String>,
        #[label("here")]
        span: SourceSpan,
        message: String,
    },

    #[error("dictionary root must be a JSON object, found {found}")]
    #[diagnostic(code(lokal::dictionary::root))]
    NotAnObject { found: &'static str },

    #[error("entry '{key}' is {found}; expected a string or an object")]
    #[diagnostic(
        code(lokal::dictionary::value),
        help("arrays and nulls cannot be translation texts")
    )]
    UnsupportedValue { key: String, found: &'static str },

    #[error("{0}")]
    #[diagnostic(code(lokal::dictionary::key))]
    Load(#[from] lokal::LoadError),
}

/// Reads and flattens the dictionary at `path`.
pub fn read_dictionary(path: &Path) -> miette::Result<Vec<(String, String)>> {
    let content = read_to_string(path).map_err(|e| DictionaryError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    Ok(parse_dictionary(&path.display().to_string(), &content)?)
}

/// Reads a dictionary straight into a store.
pub fn load_store(path: &Path) -> miette::Result<TranslationStore> {
    let pairs = read_dictionary(path)?;
    Ok(TranslationStore::from_pairs(pairs).map_err(DictionaryError::from)?)
}

/// Parses and flattens dictionary text; `name` labels error reports.
pub fn parse_dictionary(
    name: &str,
    content: &str,
) -> Result<Vec<(String, String)>, DictionaryError> {
    let json: Json = serde_json::from_str(content).map_err(|e| {
        // Convert line:column to byte offset.
        let offset = content
            .lines()
            .take(e.line().saturating_sub(1))
            .map(|l| l.len() + 1)
            .sum::<usize>()
            + e.column().saturating_sub(1);
        DictionaryError::Json {
            src: NamedSource::new(name, content.to_string()),
            span: (offset.min(content.len()), 1).into(),
            message: e.to_string(),
        }
    })?;

    let Json::Object(root) = json else {
        return Err(DictionaryError::NotAnObject {
            found: kind(&json),
        });
    };
    let mut pairs = Vec::new();
    flatten("", &root, &mut pairs)?;
    Ok(pairs)
}

fn flatten(
    prefix: &str,
    object: &Map<String, Json>,
    pairs: &mut Vec<(String, String)>,
) -> Result<(), DictionaryError> {
    for (name, value) in object {
        let key = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}.{name}")
        };
        match value {
            Json::Object(children) => flatten(&key, children, pairs)?,
            Json::String(text) => pairs.push((key, text.clone())),
            Json::Number(n) => pairs.push((key, n.to_string())),
            Json::Bool(b) => pairs.push((key, b.to_string())),
            Json::Array(_) | Json::Null => {
                return Err(DictionaryError::UnsupportedValue {
                    key,
                    found: kind(value),
                });
            }
        }
    }
    Ok(())
}

fn kind(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "an array",
        Json::Object(_) => "an object",
    }
}
