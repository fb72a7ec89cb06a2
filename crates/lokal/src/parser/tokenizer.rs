//! Template tokenizer using winnow.
//!
//! Splits a translated string into a [`TokenTree`]. At each position the
//! first matching rule wins:
//! - `\X` escapes: emit `X` as text
//! - `$key$` / `$@key$` key references
//! - `{expr}` / `{expr:format}` dynamic values (nested braces allowed)
//! - `§X...§` / `§#RRGGBB...§` color tags, whose inner text is tokenized
//!   recursively by a pooled tokenizer
//!
//! A construct that does not close is rolled back and its opening character
//! becomes text. Color tags nest at most [`MAX_COLOR_NESTING`] levels deep;
//! an opener beyond that is kept as text.

use winnow::combinator::{alt, opt, preceded};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::{any, take_till};

use super::token::{IssueKind, NewToken, TokenId, TokenKind, TokenTree};
use crate::pool::{Pooled, Pools, Reusable};
use crate::types::ColorCode;

const COLOR_MARK: char = '§';

/// Deepest nesting of color tags inside one template.
pub const MAX_COLOR_NESTING: usize = 64;

/// Tokenizes `source` into a tree rented from `pools`.
///
/// # Example
///
/// ```
/// use lokal::Pools;
/// use lokal::parser::{TokenKind, tokenize};
///
/// let pools = Pools::new();
/// let tree = tokenize("Deal {damage} to $Unit.name$", &pools);
/// let kinds: Vec<TokenKind> = tree.root().children().map(|t| t.kind()).collect();
/// assert_eq!(
///     kinds,
///     [TokenKind::Literal, TokenKind::DynamicValue, TokenKind::Literal, TokenKind::KeyReference]
/// );
/// ```
pub fn tokenize<'p>(source: &str, pools: &'p Pools) -> Pooled<'p, TokenTree> {
    let mut tree = pools.trees.rent();
    let mut tokenizer = pools.tokenizers.rent();
    tokenizer.tokenize_into(source, &mut tree, pools);
    tree
}

/// Reusable tokenizer state: the literal run being accumulated.
#[derive(Debug, Default)]
pub struct Tokenizer {
    literal: String,
    literal_start: Option<usize>,
}

impl Reusable for Tokenizer {
    fn reset(&mut self) {
        self.literal.clear();
        self.literal_start = None;
    }
}

/// One step of the tokenizer.
#[derive(Debug, Clone, PartialEq)]
enum Piece<'i> {
    /// A run of ordinary characters.
    Text(&'i str),
    /// The character after a backslash.
    Escaped(char),
    KeyReference { key: &'i str, tooltip: bool },
    DynamicValue { content: &'i str, format: Option<&'i str> },
    ColorTag { code: &'i str, inner: &'i str },
    /// A color opener that would nest past [`MAX_COLOR_NESTING`].
    DeepColorMark,
    /// A special character whose construct did not match.
    Stray(char),
}

impl Tokenizer {
    /// Clears `tree` and fills it with the tokens of `source`.
    pub fn tokenize_into(&mut self, source: &str, tree: &mut TokenTree, pools: &Pools) {
        tree.begin(source);
        self.tokenize_children(source, 0, 0, tree, TokenId::ROOT, pools);
    }

    /// Tokenizes `source` (found at byte `base` of the tree's source) and
    /// appends the tokens as children of `parent`, which sits inside `level`
    /// color tags.
    fn tokenize_children(
        &mut self,
        source: &str,
        base: usize,
        level: usize,
        tree: &mut TokenTree,
        parent: TokenId,
        pools: &Pools,
    ) {
        self.reset();
        let mut input = source;
        let color_budget = MAX_COLOR_NESTING.saturating_sub(level);

        while !input.is_empty() {
            let start = base + (source.len() - input.len());
            let piece = match piece(&mut input, color_budget) {
                Ok(piece) => piece,
                Err(_) => {
                    // `stray` accepts any character, so this only guards the loop.
                    self.push_text(start, input);
                    break;
                }
            };
            let end = base + (source.len() - input.len());

            match piece {
                Piece::Text(text) => self.push_text(start, text),
                Piece::Escaped(c) => {
                    self.literal_start.get_or_insert(start);
                    self.literal.push(c);
                }
                Piece::DeepColorMark => {
                    tree.add_issue(IssueKind::ColorNestingTooDeep, start..end);
                    self.literal_start.get_or_insert(start);
                    self.literal.push(COLOR_MARK);
                }
                Piece::Stray(c) => {
                    if let Some(kind) = stray_issue(c, input) {
                        tree.add_issue(kind, start..end);
                    }
                    self.literal_start.get_or_insert(start);
                    self.literal.push(c);
                }
                Piece::KeyReference { key, tooltip } => {
                    self.flush(tree, parent, start);
                    let key_start = start + 1 + usize::from(tooltip);
                    tree.push(
                        parent,
                        NewToken {
                            kind: TokenKind::KeyReference,
                            raw: start..end,
                            content: key_start..key_start + key.len(),
                            metadata: None,
                            tooltip,
                        },
                    );
                }
                Piece::DynamicValue { content, format } => {
                    self.flush(tree, parent, start);
                    let content_start = start + 1;
                    let content_end = content_start + content.len();
                    let metadata = format.map(|f| content_end + 1..content_end + 1 + f.len());
                    tree.push(
                        parent,
                        NewToken {
                            kind: TokenKind::DynamicValue,
                            raw: start..end,
                            content: content_start..content_end,
                            metadata,
                            tooltip: false,
                        },
                    );
                }
                Piece::ColorTag { code, inner } => {
                    self.flush(tree, parent, start);
                    let code_start = start + COLOR_MARK.len_utf8();
                    let inner_start = code_start + code.len();
                    let id = tree.push(
                        parent,
                        NewToken {
                            kind: TokenKind::ColorTag,
                            raw: start..end,
                            content: inner_start..inner_start + inner.len(),
                            metadata: Some(code_start..inner_start),
                            tooltip: false,
                        },
                    );
                    let mut nested = pools.tokenizers.rent();
                    nested.tokenize_children(inner, inner_start, level + 1, tree, id, pools);
                }
            }
        }

        let end = base + source.len();
        self.flush(tree, parent, end);
    }

    fn push_text(&mut self, start: usize, text: &str) {
        self.literal_start.get_or_insert(start);
        self.literal.push_str(text);
    }

    /// Emits the accumulated literal run, which ends at byte `end`.
    fn flush(&mut self, tree: &mut TokenTree, parent: TokenId, end: usize) {
        let Some(start) = self.literal_start.take() else {
            return;
        };
        let content = tree.append_text(&self.literal);
        self.literal.clear();
        tree.push(
            parent,
            NewToken {
                kind: TokenKind::Literal,
                raw: start..end,
                content,
                metadata: None,
                tooltip: false,
            },
        );
    }
}

/// Which issue, if any, a rolled-back opener represents. `rest` is the input
/// after the opener.
fn stray_issue(c: char, rest: &str) -> Option<IssueKind> {
    match c {
        '{' => Some(IssueKind::UnbalancedBraces),
        COLOR_MARK if ColorCode::read(rest).is_some() => Some(IssueKind::UnclosedColorTag),
        _ => None,
    }
}

/// Parse one piece, trying rules in priority order. `color_budget` is how
/// many more color tags may nest at this position.
fn piece<'i>(input: &mut &'i str, color_budget: usize) -> ModalResult<Piece<'i>> {
    alt((
        escape,
        key_reference,
        dynamic_value,
        |i: &mut &'i str| color_tag(i, color_budget),
        text,
        stray,
    ))
    .parse_next(input)
}

/// Parse `\X`.
fn escape<'i>(input: &mut &'i str) -> ModalResult<Piece<'i>> {
    preceded('\\', any).map(Piece::Escaped).parse_next(input)
}

/// Parse `$key$` or `$@key$`. Everything up to the next `$` is the key; it
/// is validated when the reference is evaluated.
fn key_reference<'i>(input: &mut &'i str) -> ModalResult<Piece<'i>> {
    ('$', opt('@'), take_till(0.., '$'), '$')
        .map(|(_, at, key, _)| Piece::KeyReference {
            key,
            tooltip: at.is_some(),
        })
        .parse_next(input)
}

/// Parse `{content}` or `{content:format}` with nested braces.
fn dynamic_value<'i>(input: &mut &'i str) -> ModalResult<Piece<'i>> {
    let text = *input;
    if !text.starts_with('{') {
        return Err(backtrack());
    }

    let mut depth = 0usize;
    let mut split = None;
    for (i, c) in text.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let (content, format) = match split {
                        Some(colon) => (&text[1..colon], Some(&text[colon + 1..i])),
                        None => (&text[1..i], None),
                    };
                    *input = &text[i + 1..];
                    return Ok(Piece::DynamicValue { content, format });
                }
            }
            ':' if depth == 1 && split.is_none() => split = Some(i),
            _ => {}
        }
    }
    Err(backtrack())
}

/// Parse `§CODE inner §`.
///
/// The closer is found by depth matching, so `§Ra§Gb§c§` nests. When the
/// marks do not balance, the first `§` after the code closes the tag, so
/// `§Y10§Gold` is a tag around `10`. A tag whose nested openers would exceed
/// `budget` levels yields [`Piece::DeepColorMark`] for its opening mark.
fn color_tag<'i>(input: &mut &'i str, budget: usize) -> ModalResult<Piece<'i>> {
    let text = *input;
    let Some(after_mark) = text.strip_prefix(COLOR_MARK) else {
        return Err(backtrack());
    };
    let Some((_, code_len)) = ColorCode::read(after_mark) else {
        return Err(backtrack());
    };
    let body = &after_mark[code_len..];
    let close = match find_color_close(body, budget) {
        ColorClose::Matched(close) | ColorClose::FirstMark(close) => close,
        ColorClose::TooDeep => {
            *input = after_mark;
            return Ok(Piece::DeepColorMark);
        }
        ColorClose::Missing => return Err(backtrack()),
    };

    *input = &body[close + COLOR_MARK.len_utf8()..];
    Ok(Piece::ColorTag {
        code: &after_mark[..code_len],
        inner: &body[..close],
    })
}

/// Where a color tag's body ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColorClose {
    /// The depth-matched closer.
    Matched(usize),
    /// No balanced closer; the first unescaped `§`.
    FirstMark(usize),
    /// Nested openers exceed the nesting budget.
    TooDeep,
    /// No unescaped `§` at all.
    Missing,
}

/// Finds the `§` closing a color tag whose body starts `body`.
///
/// A `§` followed by a color code opens a nested level; any other `§` closes
/// one. Escaped characters are skipped. Scanning stops once the open levels
/// exceed `budget`.
fn find_color_close(body: &str, budget: usize) -> ColorClose {
    if budget == 0 {
        return ColorClose::TooDeep;
    }
    let mut depth = 1usize;
    let mut first_mark = None;
    let mut chars = body.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            COLOR_MARK => {
                first_mark.get_or_insert(i);
                let rest = &body[i + COLOR_MARK.len_utf8()..];
                if ColorCode::read(rest).is_some() {
                    depth += 1;
                    if depth > budget {
                        return ColorClose::TooDeep;
                    }
                } else {
                    depth -= 1;
                    if depth == 0 {
                        return ColorClose::Matched(i);
                    }
                }
            }
            _ => {}
        }
    }
    first_mark.map_or(ColorClose::Missing, ColorClose::FirstMark)
}

/// Parse a run of characters that start no construct.
fn text<'i>(input: &mut &'i str) -> ModalResult<Piece<'i>> {
    take_till(1.., ['\\', '$', '{', COLOR_MARK])
        .map(Piece::Text)
        .parse_next(input)
}

/// Parse a single special character as text after its construct failed.
fn stray<'i>(input: &mut &'i str) -> ModalResult<Piece<'i>> {
    any.map(Piece::Stray).parse_next(input)
}

fn backtrack() -> ErrMode<ContextError> {
    ErrMode::Backtrack(ContextError::new())
}
