//! The translation entry point: store, formats, pools and options together.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::Arc;

use bon::Builder;

use crate::interpreter::context::{EvaluationContext, Params};
use crate::interpreter::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, LoadError};
use crate::interpreter::evaluator::Evaluator;
use crate::interpreter::format::FormatRegistry;
use crate::interpreter::store::TranslationStore;
use crate::parser::{SubtractionMode, TokenTree, tokenize};
use crate::pool::{Pooled, Pools};
use crate::types::Key;

/// Which key references get decorated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecorationScope {
    /// No reference is decorated.
    Never,
    /// Only `$@key$` references.
    #[default]
    TooltipsOnly,
    /// Every expanded reference.
    All,
}

/// Markup wrapped around the expansion of a key reference.
///
/// With both options on, `$@Status.burn$` renders as
/// `<link=Status.burn><u>...</u></link>`, which the UI layer turns into a
/// tooltip anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Builder)]
pub struct ReferenceDecoration {
    /// Wrap in `<u>...</u>`.
    #[builder(default = true)]
    pub underline: bool,
    /// Wrap in `<link=key>...</link>`.
    #[builder(default = true)]
    pub link: bool,
    #[builder(default)]
    pub scope: DecorationScope,
}

impl Default for ReferenceDecoration {
    fn default() -> Self {
        ReferenceDecoration::builder().build()
    }
}

impl ReferenceDecoration {
    /// Decoration that never applies.
    pub const NONE: ReferenceDecoration = ReferenceDecoration {
        underline: false,
        link: false,
        scope: DecorationScope::Never,
    };

    /// Returns true if a reference with the given tooltip flag is decorated.
    pub fn applies(&self, tooltip: bool) -> bool {
        match self.scope {
            DecorationScope::Never => false,
            DecorationScope::TooltipsOnly => tooltip,
            DecorationScope::All => true,
        }
    }

    /// Appends `text`, decorated if the reference qualifies.
    pub fn apply(&self, key: &str, tooltip: bool, text: &str, out: &mut String) {
        if !self.applies(tooltip) {
            out.push_str(text);
            return;
        }
        if self.link {
            out.push_str("<link=");
            out.push_str(key);
            out.push('>');
        }
        if self.underline {
            out.push_str("<u>");
        }
        out.push_str(text);
        if self.underline {
            out.push_str("</u>");
        }
        if self.link {
            out.push_str("</link>");
        }
    }
}

/// The result of one top-level evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    pub text: String,
    pub diagnostics: Diagnostics,
}

impl Display for Evaluation {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.text)
    }
}

/// Translates keys and renders templates.
///
/// # Example
///
/// ```
/// use lokal::{Key, Translator, params};
///
/// let mut translator = Translator::new();
/// translator
///     .reload([
///         ("Unit.Knight.name", "Knight"),
///         ("Combat.hit", "$Unit.Knight.name$ deals §R{damage:F1}§ damage"),
///     ])
///     .unwrap();
///
/// let text = translator.translate(&Key::parse("Combat.hit").unwrap(), &params! { "damage" => 12.34 });
/// assert_eq!(text, "Knight deals <color=#FF0000>12.3</color> damage");
/// ```
#[derive(Builder)]
pub struct Translator {
    #[builder(default)]
    store: TranslationStore,

    /// Number formats for `{expr:format}`.
    #[builder(default = FormatRegistry::with_defaults())]
    formats: FormatRegistry,

    /// Pools shared with other translators, if any.
    #[builder(default)]
    pools: Arc<Pools>,

    /// Expansion depth limit for contexts built by this translator.
    #[builder(default = EvaluationContext::DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    #[builder(default)]
    decoration: ReferenceDecoration,

    #[builder(default)]
    subtraction: SubtractionMode,
}

impl Default for Translator {
    fn default() -> Self {
        Translator::builder().build()
    }
}

impl Translator {
    /// Create a translator with an empty store and default options.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self) -> &TranslationStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut TranslationStore {
        &mut self.store
    }

    pub fn formats_mut(&mut self) -> &mut FormatRegistry {
        &mut self.formats
    }

    pub fn pools(&self) -> &Arc<Pools> {
        &self.pools
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Replaces the store's entries.
    pub fn reload<I, K, T>(&mut self, pairs: I) -> Result<usize, LoadError>
    where
        I: IntoIterator<Item = (K, T)>,
        K: AsRef<str>,
        T: Into<String>,
    {
        self.store.load(pairs)
    }

    /// A top-level context over `params` using this translator's depth limit.
    pub fn context<'a>(&self, params: &'a Params) -> EvaluationContext<'a> {
        EvaluationContext::new(params).with_max_depth(self.max_depth)
    }

    /// Tokenizes a template with this translator's pools.
    pub fn tokenize(&self, text: &str) -> Pooled<'_, TokenTree> {
        tokenize(text, &self.pools)
    }

    /// Renders a token tree.
    pub fn evaluate(&self, tree: &TokenTree, ctx: EvaluationContext<'_>) -> Evaluation {
        let mut evaluation = Evaluation {
            text: String::with_capacity(tree.source().len()),
            diagnostics: Diagnostics::new(),
        };
        self.evaluator()
            .evaluate(tree, ctx, &mut evaluation.text, &mut evaluation.diagnostics);
        evaluation
    }

    /// Tokenizes and renders a template.
    pub fn render(&self, template: &str, ctx: EvaluationContext<'_>) -> Evaluation {
        let tree = self.tokenize(template);
        self.evaluate(&tree, ctx)
    }

    /// Translates `key`, discarding diagnostics.
    ///
    /// A missing key renders as the key itself.
    pub fn translate(&self, key: &Key, params: &Params) -> String {
        self.translate_with(key, self.context(params)).text
    }

    /// Translates `key` in `ctx`.
    pub fn translate_with(&self, key: &Key, ctx: EvaluationContext<'_>) -> Evaluation {
        match self.store.get(key) {
            Some(template) => self.render(template, ctx),
            None => {
                let mut diagnostics = Diagnostics::new();
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::KeyNotFound,
                    key.as_str(),
                    self.store.missing_key_message(key),
                ));
                Evaluation {
                    text: key.to_string(),
                    diagnostics,
                }
            }
        }
    }

    /// Every key at or below `partial`.
    pub fn lookup(&self, partial: &Key) -> Vec<Key> {
        self.store.lookup(partial)
    }

    /// Completions for a partially typed key.
    pub fn options(&self, partial: &str) -> Vec<String> {
        self.store.options(partial)
    }

    fn evaluator(&self) -> Evaluator<'_> {
        Evaluator::builder()
            .store(&self.store)
            .formats(&self.formats)
            .pools(&self.pools)
            .decoration(self.decoration)
            .subtraction(self.subtraction)
            .build()
    }
}
