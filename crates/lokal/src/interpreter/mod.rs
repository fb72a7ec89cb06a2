//! Template evaluation.
//!
//! This module turns token trees into rendered strings. It resolves key
//! references against a [`TranslationStore`], evaluates dynamic values with
//! a [`FormatRegistry`], and records every recoverable problem as a
//! [`Diagnostic`].

mod context;
mod diagnostics;
mod evaluator;
mod format;
mod store;
mod translator;

pub use context::{Arguments, EvaluationContext, NoSource, Params, VariableSource};
pub use diagnostics::{
    Diagnostic, DiagnosticKind, Diagnostics, LoadError, Severity, compute_suggestions,
};
pub use evaluator::Evaluator;
pub use format::{ByteSizeFormat, FormatHandler, FormatRegistry, PermilleFormat, SignedFormat};
pub use store::{TranslationEntry, TranslationStore, normalize_colors};
pub use translator::{DecorationScope, Evaluation, ReferenceDecoration, Translator};
