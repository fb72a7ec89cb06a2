//! Template tokenizer and expression parser.
//!
//! [`tokenize`] splits a translated string into a [`TokenTree`]; the content
//! of each dynamic value is parsed on demand by [`Expr::parse`].

pub mod error;
pub mod expression;
mod token;
mod tokenizer;

pub use error::ExprError;
pub use expression::{BinaryOp, Expr, MAX_NESTING, Param, SubtractionMode, Variable};
pub use token::{Children, IssueKind, Token, TokenId, TokenKind, TokenTree, TokenizeIssue};
pub use tokenizer::{MAX_COLOR_NESTING, Tokenizer, tokenize};
