//! Token tree evaluation.
//!
//! Walks a [`TokenTree`] and appends its rendering to an output string:
//! - literals are copied, and the root literal recurses into its children
//! - key references are looked up and their text expanded one level deeper
//! - dynamic values are resolved or parsed as expressions, then formatted
//! - color tags become `<color=#RRGGBB>...</color>`
//!
//! Nothing here fails. Problems become [`Diagnostic`]s and a fallback text
//! (the raw key, the original `{...}`) is written in place of the token.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use bon::Builder;
use tracing::trace;

use crate::interpreter::context::{Arguments, EvaluationContext};
use crate::interpreter::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::interpreter::format::FormatRegistry;
use crate::interpreter::store::TranslationStore;
use crate::interpreter::translator::ReferenceDecoration;
use crate::parser::{
    Expr, ExprError, IssueKind, SubtractionMode, Token, TokenKind, TokenTree, Variable, tokenize,
};
use crate::pool::Pools;
use crate::types::{ColorCode, Key, Value};

/// Characters that can start a construct; text without them renders as is.
const SPECIAL: [char; 4] = ['\\', '$', '{', '§'];

/// Renders token trees against a store.
///
/// # Example
///
/// ```
/// use lokal::interpreter::{EvaluationContext, Evaluator, FormatRegistry, Params, TranslationStore};
/// use lokal::{Diagnostics, Pools, parser};
///
/// let store = TranslationStore::from_pairs([("Unit.name", "Knight")]).unwrap();
/// let formats = FormatRegistry::with_defaults();
/// let pools = Pools::new();
/// let evaluator = Evaluator::builder().store(&store).formats(&formats).pools(&pools).build();
///
/// let tree = parser::tokenize("Hail, $Unit.name$!", &pools);
/// let params = Params::new();
/// let mut out = String::new();
/// let mut diagnostics = Diagnostics::new();
/// evaluator.evaluate(&tree, EvaluationContext::new(&params), &mut out, &mut diagnostics);
/// assert_eq!(out, "Hail, Knight!");
/// ```
#[derive(Builder)]
pub struct Evaluator<'t> {
    store: &'t TranslationStore,
    formats: &'t FormatRegistry,
    pools: &'t Pools,
    #[builder(default)]
    decoration: ReferenceDecoration,
    #[builder(default)]
    subtraction: SubtractionMode,
}

impl Evaluator<'_> {
    /// Appends the rendering of `tree` to `out`.
    pub fn evaluate(
        &self,
        tree: &TokenTree,
        ctx: EvaluationContext<'_>,
        out: &mut String,
        diagnostics: &mut Diagnostics,
    ) {
        for issue in tree.issues() {
            let message = match issue.kind {
                IssueKind::UnbalancedBraces => "unbalanced '{' kept as text",
                IssueKind::UnclosedColorTag => "unclosed color tag kept as text",
                IssueKind::ColorNestingTooDeep => "color tag nested too deep kept as text",
            };
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticKind::TokenizationError,
                    &tree.source()[issue.span.clone()],
                    message,
                )
                .with_span(issue.span.clone())
                .at_depth(ctx.depth()),
            );
        }
        self.eval_token(tree.root(), ctx, out, diagnostics);
    }

    /// Tokenizes `text` and appends its rendering.
    pub fn expand(
        &self,
        text: &str,
        ctx: EvaluationContext<'_>,
        out: &mut String,
        diagnostics: &mut Diagnostics,
    ) {
        if !text.contains(SPECIAL) {
            out.push_str(text);
            return;
        }
        let tree = tokenize(text, self.pools);
        self.evaluate(&tree, ctx, out, diagnostics);
    }

    fn eval_token(
        &self,
        token: Token<'_>,
        ctx: EvaluationContext<'_>,
        out: &mut String,
        diagnostics: &mut Diagnostics,
    ) {
        match token.kind() {
            TokenKind::Literal => self.eval_children_or_content(token, ctx, out, diagnostics),
            TokenKind::KeyReference => self.eval_key_reference(token, ctx, out, diagnostics),
            TokenKind::DynamicValue => self.eval_dynamic_value(token, ctx, out, diagnostics),
            TokenKind::ColorTag => {
                let hex = token
                    .metadata()
                    .and_then(ColorCode::parse)
                    .map_or("", |code| code.hex());
                out.push_str("<color=");
                out.push_str(hex);
                out.push('>');
                self.eval_children_or_content(token, ctx, out, diagnostics);
                out.push_str("</color>");
            }
        }
    }

    fn eval_children_or_content(
        &self,
        token: Token<'_>,
        ctx: EvaluationContext<'_>,
        out: &mut String,
        diagnostics: &mut Diagnostics,
    ) {
        if token.has_children() {
            for child in token.children() {
                self.eval_token(child, ctx, out, diagnostics);
            }
        } else {
            out.push_str(token.content());
        }
    }

    fn eval_key_reference(
        &self,
        token: Token<'_>,
        ctx: EvaluationContext<'_>,
        out: &mut String,
        diagnostics: &mut Diagnostics,
    ) {
        let name = token.content();
        let key = match Key::parse(name) {
            Ok(key) => key,
            Err(e) => {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticKind::KeyNotFound,
                        name,
                        format!("invalid key '{name}'"),
                    )
                    .with_cause(e)
                    .with_span(token.raw_span())
                    .at_depth(ctx.depth()),
                );
                out.push_str(name);
                return;
            }
        };

        let Some(text) = self.store.get(&key) else {
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticKind::KeyNotFound,
                    name,
                    self.store.missing_key_message(&key),
                )
                    .with_span(token.raw_span())
                    .at_depth(ctx.depth()),
            );
            out.push_str(name);
            return;
        };

        if !ctx.can_recurse() {
            diagnostics.push(recursion_depth(name, ctx).with_span(token.raw_span()));
            out.push_str(text);
            return;
        }

        trace!(key = name, depth = ctx.depth() + 1, "expanding key reference");
        let mut scratch = self.pools.strings.rent();
        self.expand(text, ctx.descend(), &mut scratch, diagnostics);
        self.decoration.apply(name, token.is_tooltip(), &scratch, out);
    }

    fn eval_dynamic_value(
        &self,
        token: Token<'_>,
        ctx: EvaluationContext<'_>,
        out: &mut String,
        diagnostics: &mut Diagnostics,
    ) {
        match self.dynamic_value(token.content(), token.metadata(), ctx, diagnostics) {
            Ok(text) => out.push_str(&text),
            Err(e) => {
                diagnostics.push(
                    Diagnostic::new(diagnostic_kind(&e), token.raw(), e.to_string())
                        .with_span(token.raw_span())
                        .at_depth(ctx.depth()),
                );
                out.push_str(token.raw());
            }
        }
    }

    fn dynamic_value(
        &self,
        content: &str,
        spec: Option<&str>,
        ctx: EvaluationContext<'_>,
        diagnostics: &mut Diagnostics,
    ) -> Result<String, ExprError> {
        let value = match Variable::parse_bare(content) {
            Some(variable) => self.resolve(&variable, ctx, diagnostics)?,
            None => {
                let expr = Expr::parse(content)?;
                expr.evaluate(self.subtraction, &mut |variable: &Variable| {
                    self.resolve(variable, ctx, diagnostics)
                })?
            }
        };

        if let Value::String(text) = value {
            return Ok(text);
        }
        catch_unwind(AssertUnwindSafe(|| self.formats.format_value(&value, spec))).map_err(
            |payload| ExprError::Panicked {
                name: spec.unwrap_or_default().to_string(),
                message: panic_message(payload.as_ref()),
            },
        )
    }

    /// Resolves a variable: call parameters first, then the context's
    /// variable source. String results are expanded one level deeper.
    fn resolve(
        &self,
        variable: &Variable,
        ctx: EvaluationContext<'_>,
        diagnostics: &mut Diagnostics,
    ) -> Result<Value, ExprError> {
        let value = match ctx.variable(&variable.name) {
            Some(value) => value.clone(),
            None => {
                let args = Arguments::new(&variable.params, ctx.variables());
                let source = ctx.source();
                catch_unwind(AssertUnwindSafe(|| source.escape_value(&variable.name, &args)))
                    .map_err(|payload| ExprError::Panicked {
                        name: variable.name.clone(),
                        message: panic_message(payload.as_ref()),
                    })?
                    .ok_or_else(|| ExprError::UnresolvedVariable {
                        name: variable.name.clone(),
                    })?
            }
        };

        let Value::String(text) = value else {
            return Ok(value);
        };
        if !text.contains(SPECIAL) {
            return Ok(Value::String(text));
        }
        if !ctx.can_recurse() {
            diagnostics.push(recursion_depth(&variable.name, ctx));
            return Ok(Value::String(text));
        }

        trace!(variable = %variable.name, depth = ctx.depth() + 1, "expanding variable");
        let mut scratch = self.pools.strings.rent();
        self.expand(&text, ctx.descend(), &mut scratch, diagnostics);
        Ok(Value::String(scratch.as_str().to_string()))
    }
}

fn recursion_depth(context: &str, ctx: EvaluationContext<'_>) -> Diagnostic {
    Diagnostic::new(
        DiagnosticKind::RecursionDepth,
        context,
        format!(
            "expansion depth limit {} reached at '{context}'; raw text used",
            ctx.max_depth()
        ),
    )
    .at_depth(ctx.depth())
}

fn diagnostic_kind(error: &ExprError) -> DiagnosticKind {
    match error {
        ExprError::Syntax { .. } | ExprError::TooDeep { .. } => DiagnosticKind::ParseError,
        ExprError::UnresolvedVariable { .. } => DiagnosticKind::VariableResolution,
        ExprError::InvalidOperands { .. }
        | ExprError::DivisionByZero
        | ExprError::InvalidRepeat { .. } => DiagnosticKind::EvaluationError,
        ExprError::Panicked { .. } => DiagnosticKind::UnexpectedError,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
