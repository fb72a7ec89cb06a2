//! Arithmetic expressions inside `{...}`.
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! expression := term (('+' | '-') term)*
//! term       := exponent (('*' | '/') exponent)*
//! exponent   := primary ('^' primary)*
//! primary    := number | variable | '(' expression ')'
//! ```
//!
//! Numbers are floats; a `-` directly before a number where an operand is
//! expected belongs to the number, and there is no unary minus. Variables are
//! `name` or `name<p1,p2,...>` and are resolved only when evaluated.

use std::fmt::{Display, Formatter, Result as FmtResult};

use winnow::ascii::digit1;
use winnow::combinator::{alt, delimited, opt, repeat};
use winnow::prelude::*;
use winnow::token::{one_of, take_till, take_while};

use super::error::ExprError;
use crate::types::Value;

/// Deepest parenthesis nesting accepted by [`Expr::parse`].
pub const MAX_NESTING: usize = 64;

/// Longest string `string * n` may produce, in repetitions.
const MAX_REPEAT: f64 = 10_000.0;

/// A binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
}

impl BinaryOp {
    pub fn symbol(self) -> char {
        match self {
            BinaryOp::Add => '+',
            BinaryOp::Subtract => '-',
            BinaryOp::Multiply => '*',
            BinaryOp::Divide => '/',
            BinaryOp::Power => '^',
        }
    }

    fn from_symbol(c: char) -> BinaryOp {
        match c {
            '+' => BinaryOp::Add,
            '-' => BinaryOp::Subtract,
            '*' => BinaryOp::Multiply,
            '/' => BinaryOp::Divide,
            _ => BinaryOp::Power,
        }
    }
}

/// How the `-` operator evaluates.
///
/// Existing translation data was authored against an evaluator whose `-`
/// added its operands. `Legacy` keeps that result until the data owners
/// confirm that true subtraction is wanted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubtractionMode {
    /// `a - b` evaluates to `a + b`.
    #[default]
    Legacy,
    /// `a - b` evaluates to `a - b`.
    Arithmetic,
}

/// A parameter written inside `name<...>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    /// `key=value`
    Named { key: String, value: String },
    /// A bare token.
    Flag(String),
}

/// A variable reference: `name` or `name<params>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub name: String,
    pub params: Vec<Param>,
}

impl Variable {
    /// Parses `text` if it consists of a single variable reference and
    /// nothing else (surrounding whitespace aside).
    pub fn parse_bare(text: &str) -> Option<Variable> {
        let mut input = text.trim();
        let parsed = variable.parse_next(&mut input).ok()?;
        input.is_empty().then_some(parsed)
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.name)?;
        if self.params.is_empty() {
            return Ok(());
        }
        f.write_str("<")?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            match param {
                Param::Named { key, value } => write!(f, "{key}={value}")?,
                Param::Flag(flag) => f.write_str(flag)?,
            }
        }
        f.write_str(">")
    }
}

/// A parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Variable(Variable),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    /// Parses an expression.
    ///
    /// # Example
    ///
    /// ```
    /// use lokal::parser::{Expr, SubtractionMode};
    ///
    /// let expr = Expr::parse("2 + 3 * 4").unwrap();
    /// let value = expr.evaluate(SubtractionMode::Legacy, &mut |_| unreachable!()).unwrap();
    /// assert_eq!(value.to_string(), "14");
    /// ```
    pub fn parse(text: &str) -> Result<Expr, ExprError> {
        check_nesting(text)?;
        let mut input = text;
        match delimited(ws, expression, ws).parse_next(&mut input) {
            Ok(expr) if input.is_empty() => Ok(expr),
            Ok(_) => Err(ExprError::Syntax {
                column: column(text, input),
                message: format!(
                    "unexpected character: '{}'",
                    input.chars().next().unwrap_or('?')
                ),
            }),
            Err(e) => Err(ExprError::Syntax {
                column: column(text, input),
                message: format!("parse error: {e}"),
            }),
        }
    }

    /// Evaluates the expression, resolving variables through `resolve`.
    pub fn evaluate(
        &self,
        mode: SubtractionMode,
        resolve: &mut dyn FnMut(&Variable) -> Result<Value, ExprError>,
    ) -> Result<Value, ExprError> {
        match self {
            Expr::Number(n) => Ok(Value::Float(*n)),
            Expr::Variable(variable) => resolve(variable),
            Expr::Binary { op, lhs, rhs } => {
                let lhs = lhs.evaluate(mode, resolve)?;
                let rhs = rhs.evaluate(mode, resolve)?;
                apply(*op, lhs, rhs, mode)
            }
        }
    }
}

/// Applies a binary operator. Integer operands stay integers for `+ - *`
/// unless the result overflows.
fn apply(op: BinaryOp, lhs: Value, rhs: Value, mode: SubtractionMode) -> Result<Value, ExprError> {
    let invalid = |lhs: &Value, rhs: &Value| ExprError::InvalidOperands {
        op: op.symbol(),
        lhs: lhs.type_name(),
        rhs: rhs.type_name(),
    };

    match op {
        BinaryOp::Add => match (&lhs, &rhs) {
            (Value::String(_), _) | (_, Value::String(_)) => {
                Ok(Value::String(format!("{lhs}{rhs}")))
            }
            _ => Ok(numeric(&lhs, &rhs, i64::checked_add, |a, b| a + b)),
        },
        BinaryOp::Subtract => {
            if !lhs.is_numeric() || !rhs.is_numeric() {
                return Err(invalid(&lhs, &rhs));
            }
            Ok(match mode {
                SubtractionMode::Legacy => numeric(&lhs, &rhs, i64::checked_add, |a, b| a + b),
                SubtractionMode::Arithmetic => {
                    numeric(&lhs, &rhs, i64::checked_sub, |a, b| a - b)
                }
            })
        }
        BinaryOp::Multiply => match (&lhs, &rhs) {
            (Value::String(s), n) | (n, Value::String(s)) if n.is_numeric() => {
                repeat_string(s, n.as_f64().unwrap_or_default())
            }
            _ if lhs.is_numeric() && rhs.is_numeric() => {
                Ok(numeric(&lhs, &rhs, i64::checked_mul, |a, b| a * b))
            }
            _ => Err(invalid(&lhs, &rhs)),
        },
        BinaryOp::Divide => match (lhs.as_f64(), rhs.as_f64()) {
            (Some(_), Some(b)) if b == 0.0 => Err(ExprError::DivisionByZero),
            (Some(a), Some(b)) => Ok(Value::Float(a / b)),
            _ => Err(invalid(&lhs, &rhs)),
        },
        BinaryOp::Power => match (lhs.as_f64(), rhs.as_f64()) {
            (Some(a), Some(b)) => Ok(Value::Float(a.powf(b))),
            _ => Err(invalid(&lhs, &rhs)),
        },
    }
}

fn numeric(
    lhs: &Value,
    rhs: &Value,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Value {
    if let (Value::Number(a), Value::Number(b)) = (lhs, rhs)
        && let Some(n) = int_op(*a, *b)
    {
        return Value::Number(n);
    }
    Value::Float(float_op(
        lhs.as_f64().unwrap_or_default(),
        rhs.as_f64().unwrap_or_default(),
    ))
}

fn repeat_string(s: &str, count: f64) -> Result<Value, ExprError> {
    if !count.is_finite() || count < 0.0 || count > MAX_REPEAT {
        return Err(ExprError::InvalidRepeat { count });
    }
    Ok(Value::String(s.repeat(count.trunc() as usize)))
}

/// Rejects input whose parentheses nest deeper than [`MAX_NESTING`].
fn check_nesting(text: &str) -> Result<(), ExprError> {
    let mut depth = 0usize;
    for c in text.chars() {
        match c {
            '(' => {
                depth += 1;
                if depth > MAX_NESTING {
                    return Err(ExprError::TooDeep { limit: MAX_NESTING });
                }
            }
            ')' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    Ok(())
}

/// One-based column of `remaining` within `original`.
fn column(original: &str, remaining: &str) -> usize {
    let consumed = original.len() - remaining.len();
    original[..consumed].chars().count() + 1
}

/// Parse optional whitespace.
fn ws(input: &mut &str) -> ModalResult<()> {
    take_while(0.., |c: char| c.is_whitespace())
        .void()
        .parse_next(input)
}

/// Folds `first (op operand)*` into a left-associative tree.
fn fold_left(first: Expr, rest: Vec<(char, Expr)>) -> Expr {
    rest.into_iter().fold(first, |lhs, (op, rhs)| Expr::Binary {
        op: BinaryOp::from_symbol(op),
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    })
}

/// Parse `term (('+' | '-') term)*`.
fn expression(input: &mut &str) -> ModalResult<Expr> {
    let first = term(input)?;
    let rest: Vec<(char, Expr)> =
        repeat(0.., (delimited(ws, one_of(['+', '-']), ws), term)).parse_next(input)?;
    Ok(fold_left(first, rest))
}

/// Parse `exponent (('*' | '/') exponent)*`.
fn term(input: &mut &str) -> ModalResult<Expr> {
    let first = exponent(input)?;
    let rest: Vec<(char, Expr)> =
        repeat(0.., (delimited(ws, one_of(['*', '/']), ws), exponent)).parse_next(input)?;
    Ok(fold_left(first, rest))
}

/// Parse `primary ('^' primary)*`.
fn exponent(input: &mut &str) -> ModalResult<Expr> {
    let first = primary(input)?;
    let rest: Vec<(char, Expr)> =
        repeat(0.., (delimited(ws, one_of(['^']), ws), primary)).parse_next(input)?;
    Ok(fold_left(first, rest))
}

/// Parse a number, a variable, or a parenthesized expression.
fn primary(input: &mut &str) -> ModalResult<Expr> {
    alt((
        number,
        variable.map(Expr::Variable),
        delimited(('(', ws), expression, (ws, ')')),
    ))
    .parse_next(input)
}

/// Parse `-?digits(.digits)?([eE][+-]?digits)?`.
fn number(input: &mut &str) -> ModalResult<Expr> {
    (
        opt('-'),
        digit1,
        opt(('.', digit1)),
        opt((one_of(['e', 'E']), opt(one_of(['+', '-'])), digit1)),
    )
        .take()
        .try_map(str::parse::<f64>)
        .map(Expr::Number)
        .parse_next(input)
}

/// Parse `name` or `name<params>`.
fn variable(input: &mut &str) -> ModalResult<Variable> {
    let name = (one_of(is_name_start), take_while(0.., is_name_char))
        .take()
        .parse_next(input)?;
    let params = opt(delimited('<', take_till(0.., '>'), '>')).parse_next(input)?;
    Ok(Variable {
        name: name.to_string(),
        params: params.map(parse_params).unwrap_or_default(),
    })
}

fn parse_params(text: &str) -> Vec<Param> {
    text.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| match p.split_once('=') {
            Some((key, value)) => Param::Named {
                key: key.trim().to_string(),
                value: value.trim().to_string(),
            },
            None => Param::Flag(p.to_string()),
        })
        .collect()
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '~' | ':' | '=')
}
