//! Evaluation context threaded through recursive expansion.

use std::collections::HashMap;
use std::fmt::{Debug, Formatter, Result as FmtResult};

use crate::parser::Param;
use crate::types::Value;

/// Named call parameters.
pub type Params = HashMap<String, Value>;

/// Resolves variables that are not call parameters.
///
/// Implemented by whatever object a template is rendered for; `{hp}` or
/// `{stat<kind=max>}` consult it when no parameter of that name exists.
/// Closures `Fn(&str, &Arguments) -> Option<Value>` implement it.
pub trait VariableSource {
    fn escape_value(&self, name: &str, args: &Arguments<'_>) -> Option<Value>;
}

impl<F> VariableSource for F
where
    F: Fn(&str, &Arguments<'_>) -> Option<Value>,
{
    fn escape_value(&self, name: &str, args: &Arguments<'_>) -> Option<Value> {
        self(name, args)
    }
}

/// A source that resolves nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSource;

impl VariableSource for NoSource {
    fn escape_value(&self, _name: &str, _args: &Arguments<'_>) -> Option<Value> {
        None
    }
}

/// The parameters of a `name<...>` variable, merged with the call
/// parameters: inline `key=value` pairs shadow call parameters of the same
/// name.
#[derive(Clone, Copy)]
pub struct Arguments<'a> {
    inline: &'a [Param],
    ambient: &'a Params,
}

impl<'a> Arguments<'a> {
    pub fn new(inline: &'a [Param], ambient: &'a Params) -> Self {
        Self { inline, ambient }
    }

    /// Looks up a named argument, inline values first.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inline
            .iter()
            .find_map(|param| match param {
                Param::Named { key: k, value } if k == key => Some(Value::parse_literal(value)),
                _ => None,
            })
            .or_else(|| self.ambient.get(key).cloned())
    }

    /// Returns true if a bare `flag` was written inline.
    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags().any(|f| f == flag)
    }

    /// Bare inline tokens in written order.
    pub fn flags(&self) -> impl Iterator<Item = &'a str> + use<'a> {
        self.inline.iter().filter_map(|param| match param {
            Param::Flag(flag) => Some(flag.as_str()),
            Param::Named { .. } => None,
        })
    }

    /// The inline parameters as written.
    pub fn inline(&self) -> &'a [Param] {
        self.inline
    }
}

/// Per-call evaluation state. Copied, never mutated: each expansion works on
/// a [`descend`](Self::descend)ed copy.
#[derive(Clone, Copy)]
pub struct EvaluationContext<'a> {
    depth: usize,
    max_depth: usize,
    variables: &'a Params,
    source: &'a dyn VariableSource,
}

impl Debug for EvaluationContext<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("EvaluationContext")
            .field("depth", &self.depth)
            .field("max_depth", &self.max_depth)
            .field("variables", &self.variables)
            .finish_non_exhaustive()
    }
}

impl<'a> EvaluationContext<'a> {
    /// Default expansion depth limit.
    pub const DEFAULT_MAX_DEPTH: usize = 16;

    /// Create a top-level context over `variables`.
    pub fn new(variables: &'a Params) -> Self {
        Self {
            depth: 0,
            max_depth: Self::DEFAULT_MAX_DEPTH,
            variables,
            source: &NoSource,
        }
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: &'a dyn VariableSource) -> Self {
        self.source = source;
        self
    }

    /// A copy one expansion level deeper.
    #[must_use]
    pub fn descend(&self) -> Self {
        Self {
            depth: self.depth + 1,
            ..*self
        }
    }

    /// Returns true if another expansion level is allowed.
    pub fn can_recurse(&self) -> bool {
        self.depth < self.max_depth
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn variables(&self) -> &'a Params {
        self.variables
    }

    /// Get a call parameter.
    pub fn variable(&self, name: &str) -> Option<&'a Value> {
        self.variables.get(name)
    }

    pub fn source(&self) -> &'a dyn VariableSource {
        self.source
    }
}
