pub mod interpreter;
pub mod parser;
pub mod pool;
pub mod trie;
pub mod types;

pub use interpreter::{
    DecorationScope, Diagnostic, DiagnosticKind, Diagnostics, Evaluation, EvaluationContext,
    FormatRegistry, LoadError, Params, ReferenceDecoration, Severity, TranslationStore,
    Translator, VariableSource,
};
pub use parser::SubtractionMode;
pub use pool::{PoolStats, Pools};
pub use trie::Trie;
pub use types::{Key, KeyError, Value};

// Re-export the key! macro
pub use lokal_macros::key;

/// Creates a [`Params`] map from name-value pairs.
///
/// Values are converted via `Into<Value>`, so integers, floats and strings
/// can be passed directly.
///
/// # Example
///
/// ```
/// use lokal::{params, Value};
///
/// let p = params! { "count" => 3, "name" => "Alice" };
/// assert_eq!(p.len(), 2);
/// assert_eq!(p["count"].as_number(), Some(3));
/// assert_eq!(p["name"].as_string(), Some("Alice"));
/// ```
#[macro_export]
macro_rules! params {
    {} => {
        $crate::Params::new()
    };
    { $($key:expr => $value:expr),+ $(,)? } => {
        {
            let mut map = $crate::Params::new();
            $(
                map.insert($key.to_string(), ::std::convert::Into::<$crate::Value>::into($value));
            )+
            map
        }
    };
}
