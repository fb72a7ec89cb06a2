//! Diagnostics collected while evaluating templates, and load errors.
//!
//! Evaluation never fails: every recoverable problem is recorded as a
//! [`Diagnostic`] and a fallback text is substituted in the output.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::ops::Range;
use std::slice::Iter;
use std::vec::IntoIter;

use serde::Serialize;
use strsim::levenshtein;
use thiserror::Error;
use tracing::{debug, warn};

use crate::types::KeyError;

/// Errors that occur while loading a dictionary into a store.
#[derive(Debug, Error)]
pub enum LoadError {
    /// A dictionary key is not a valid [`Key`](crate::Key).
    #[error("invalid key '{key}': {source}")]
    InvalidKey {
        key: String,
        #[source]
        source: KeyError,
    },
}

/// How bad a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Severity {
    /// The fallback text is an acceptable rendering.
    Warning,
    /// The fallback text is best effort only.
    Error,
    /// Reserved; no diagnostic kind is currently fatal.
    Fatal,
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        })
    }
}

/// What went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticKind {
    /// A `$key$` reference names no entry; the raw key was emitted.
    KeyNotFound,
    /// The expansion depth limit was reached; the raw text was emitted.
    RecursionDepth,
    /// A `{` or `§` opener never closed and was kept as text.
    TokenizationError,
    /// A `{...}` expression is malformed.
    ParseError,
    /// A variable could not be resolved.
    VariableResolution,
    /// Operands did not support an operator, or division by zero.
    EvaluationError,
    /// A variable source or format handler panicked.
    UnexpectedError,
}

impl DiagnosticKind {
    /// The severity every diagnostic of this kind carries.
    pub fn severity(self) -> Severity {
        match self {
            DiagnosticKind::KeyNotFound
            | DiagnosticKind::RecursionDepth
            | DiagnosticKind::TokenizationError => Severity::Warning,
            DiagnosticKind::ParseError
            | DiagnosticKind::VariableResolution
            | DiagnosticKind::EvaluationError
            | DiagnosticKind::UnexpectedError => Severity::Error,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DiagnosticKind::KeyNotFound => "KeyNotFound",
            DiagnosticKind::RecursionDepth => "RecursionDepth",
            DiagnosticKind::TokenizationError => "TokenizationError",
            DiagnosticKind::ParseError => "ParseError",
            DiagnosticKind::VariableResolution => "VariableResolution",
            DiagnosticKind::EvaluationError => "EvaluationError",
            DiagnosticKind::UnexpectedError => "UnexpectedError",
        }
    }
}

impl Display for DiagnosticKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.name())
    }
}

/// One recorded problem.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    /// The text the problem is about: a key, an expression, a raw token.
    pub context: String,
    pub message: String,
    /// Underlying error, if any.
    pub cause: Option<String>,
    /// Byte range of the offending token in the template it was found in.
    pub span: Option<Range<usize>>,
    /// Expansion depth of that template; 0 is the top-level template.
    pub depth: usize,
}

impl Diagnostic {
    /// Create a diagnostic whose severity follows from `kind`.
    pub fn new(kind: DiagnosticKind, context: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: kind.severity(),
            kind,
            context: context.into(),
            message: message.into(),
            cause: None,
            span: None,
            depth: 0,
        }
    }

    #[must_use]
    pub fn with_cause(mut self, cause: impl Display) -> Self {
        self.cause = Some(cause.to_string());
        self
    }

    #[must_use]
    pub fn with_span(mut self, span: Range<usize>) -> Self {
        self.span = Some(span);
        self
    }

    #[must_use]
    pub fn at_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "[{}] {}: {}", self.severity, self.kind, self.message)?;
        if let Some(cause) = &self.cause {
            write!(f, " ({cause})")?;
        }
        Ok(())
    }
}

/// The diagnostics of one top-level evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Warning => debug!(
                kind = diagnostic.kind.name(),
                context = %diagnostic.context,
                depth = diagnostic.depth,
                "{}",
                diagnostic.message
            ),
            Severity::Error | Severity::Fatal => warn!(
                kind = diagnostic.kind.name(),
                context = %diagnostic.context,
                depth = diagnostic.depth,
                "{}",
                diagnostic.message
            ),
        }
        self.entries.push(diagnostic);
    }

    /// Returns true if any diagnostic is an error or worse.
    pub fn has_errors(&self) -> bool {
        self.entries.iter().any(|d| d.severity >= Severity::Error)
    }

    pub fn has_warnings(&self) -> bool {
        self.entries.iter().any(|d| d.severity == Severity::Warning)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> Iter<'_, Diagnostic> {
        self.entries.iter()
    }

    /// Number of diagnostics of the given kind.
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries.iter().filter(|d| d.kind == kind).count()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }

    /// A count header followed by one line per diagnostic.
    ///
    /// ```
    /// use lokal::{Diagnostic, DiagnosticKind, Diagnostics};
    ///
    /// let mut diagnostics = Diagnostics::new();
    /// diagnostics.push(Diagnostic::new(DiagnosticKind::KeyNotFound, "A.B", "key 'A.B' not found"));
    /// assert_eq!(
    ///     diagnostics.summary(),
    ///     "0 errors, 1 warning\n[warning] KeyNotFound: key 'A.B' not found"
    /// );
    /// ```
    pub fn summary(&self) -> String {
        let errors = self
            .entries
            .iter()
            .filter(|d| d.severity >= Severity::Error)
            .count();
        let warnings = self.entries.len() - errors;
        let mut out = format!(
            "{errors} {}, {warnings} {}",
            plural(errors, "error", "errors"),
            plural(warnings, "warning", "warnings")
        );
        for entry in &self.entries {
            out.push('\n');
            out.push_str(&entry.to_string());
        }
        out
    }
}

fn plural(n: usize, one: &'static str, many: &'static str) -> &'static str {
    if n == 1 { one } else { many }
}

impl Display for Diagnostics {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.summary())
    }
}

impl Extend<Diagnostic> for Diagnostics {
    fn extend<I: IntoIterator<Item = Diagnostic>>(&mut self, iter: I) {
        for diagnostic in iter {
            self.push(diagnostic);
        }
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Compute "did you mean" suggestions for a misspelled name.
///
/// Candidates within Levenshtein distance 1 (names of up to 3 chars) or 2
/// (longer names) are returned closest first, at most 3.
pub fn compute_suggestions<S: AsRef<str>>(name: &str, available: &[S]) -> Vec<String> {
    let max_distance = if name.len() <= 3 { 1 } else { 2 };
    let mut suggestions: Vec<(usize, &str)> = available
        .iter()
        .map(AsRef::as_ref)
        .filter_map(|candidate| {
            let dist = levenshtein(name, candidate);
            (dist > 0 && dist <= max_distance).then_some((dist, candidate))
        })
        .collect();

    suggestions.sort_by_key(|(dist, _)| *dist);
    suggestions
        .into_iter()
        .take(3)
        .map(|(_, s)| s.to_string())
        .collect()
}
