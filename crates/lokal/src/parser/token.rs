//! Token trees produced by the tokenizer.
//!
//! A [`TokenTree`] is an arena: tokens are stored in one vector and linked to
//! their children by index, and all token text lives in one buffer whose
//! prefix is a copy of the tokenized source. Returning the tree to its pool
//! releases every token at once while keeping both allocations.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::ops::Range;

use crate::pool::Reusable;

/// The type of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Plain text, escapes already resolved. The root of every tree is a
    /// literal whose children are the top-level tokens.
    Literal,
    /// `$key$` or `$@key$`.
    KeyReference,
    /// `{expr}` or `{expr:format}`.
    DynamicValue,
    /// `§X...§` or `§#RRGGBB...§`; children hold the tokenized inner text.
    ColorTag,
}

/// Index of a token within its tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenId(usize);

impl TokenId {
    /// The synthetic root literal.
    pub const ROOT: TokenId = TokenId(0);
}

/// Problems found while tokenizing that were recovered by treating the
/// opening character as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    /// A `{` without a matching `}`.
    UnbalancedBraces,
    /// A `§` color opener without a closing `§`.
    UnclosedColorTag,
    /// A `§` color opener nested deeper than the tokenizer allows.
    ColorNestingTooDeep,
}

/// A recovered tokenization problem with its source offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizeIssue {
    pub kind: IssueKind,
    /// Byte range of the opener within the source.
    pub span: Range<usize>,
}

#[derive(Debug, Clone)]
struct Node {
    kind: TokenKind,
    raw: Range<usize>,
    content: Range<usize>,
    metadata: Option<Range<usize>>,
    tooltip: bool,
    first_child: Option<TokenId>,
    last_child: Option<TokenId>,
    next_sibling: Option<TokenId>,
}

impl Node {
    fn root() -> Self {
        Node {
            kind: TokenKind::Literal,
            raw: 0..0,
            content: 0..0,
            metadata: None,
            tooltip: false,
            first_child: None,
            last_child: None,
            next_sibling: None,
        }
    }
}

/// Fields of a token about to be added to a tree.
pub(crate) struct NewToken {
    pub kind: TokenKind,
    pub raw: Range<usize>,
    pub content: Range<usize>,
    pub metadata: Option<Range<usize>>,
    pub tooltip: bool,
}

/// An arena of tokens rooted at a synthetic literal.
#[derive(Debug, Clone)]
pub struct TokenTree {
    nodes: Vec<Node>,
    text: String,
    source_len: usize,
    issues: Vec<TokenizeIssue>,
}

impl Default for TokenTree {
    fn default() -> Self {
        Self {
            nodes: vec![Node::root()],
            text: String::new(),
            source_len: 0,
            issues: Vec::new(),
        }
    }
}

impl Reusable for TokenTree {
    fn reset(&mut self) {
        self.nodes.truncate(1);
        self.nodes[0] = Node::root();
        self.text.clear();
        self.source_len = 0;
        self.issues.clear();
    }
}

impl TokenTree {
    /// The root literal.
    pub fn root(&self) -> Token<'_> {
        Token {
            tree: self,
            id: TokenId::ROOT,
        }
    }

    /// Looks up a token by id.
    pub fn get(&self, id: TokenId) -> Option<Token<'_>> {
        (id.0 < self.nodes.len()).then_some(Token { tree: self, id })
    }

    /// Number of tokens, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the tree holds only its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// The text this tree was tokenized from.
    pub fn source(&self) -> &str {
        &self.text[..self.source_len]
    }

    /// Openers that were recovered as literal text.
    pub fn issues(&self) -> &[TokenizeIssue] {
        &self.issues
    }

    /// Clears the tree and stores `source` as the root's content.
    pub(crate) fn begin(&mut self, source: &str) {
        self.reset();
        self.text.push_str(source);
        self.source_len = source.len();
        let root = &mut self.nodes[0];
        root.raw = 0..source.len();
        root.content = 0..source.len();
    }

    /// Copies `text` into the buffer and returns its span.
    pub(crate) fn append_text(&mut self, text: &str) -> Range<usize> {
        let start = self.text.len();
        self.text.push_str(text);
        start..self.text.len()
    }

    pub(crate) fn add_issue(&mut self, kind: IssueKind, span: Range<usize>) {
        self.issues.push(TokenizeIssue { kind, span });
    }

    /// Adds a token as the last child of `parent`.
    pub(crate) fn push(&mut self, parent: TokenId, token: NewToken) -> TokenId {
        let id = TokenId(self.nodes.len());
        self.nodes.push(Node {
            kind: token.kind,
            raw: token.raw,
            content: token.content,
            metadata: token.metadata,
            tooltip: token.tooltip,
            first_child: None,
            last_child: None,
            next_sibling: None,
        });

        match self.nodes[parent.0].last_child {
            Some(last) => self.nodes[last.0].next_sibling = Some(id),
            None => self.nodes[parent.0].first_child = Some(id),
        }
        self.nodes[parent.0].last_child = Some(id);
        id
    }

    fn node(&self, id: TokenId) -> &Node {
        &self.nodes[id.0]
    }

    fn span(&self, span: &Range<usize>) -> &str {
        &self.text[span.clone()]
    }
}

/// A borrowed handle to one token of a [`TokenTree`].
#[derive(Clone, Copy)]
pub struct Token<'a> {
    tree: &'a TokenTree,
    id: TokenId,
}

impl<'a> Token<'a> {
    pub fn id(&self) -> TokenId {
        self.id
    }

    pub fn kind(&self) -> TokenKind {
        self.tree.node(self.id).kind
    }

    /// Literal text, key, expression, or color-tag inner text.
    pub fn content(&self) -> &'a str {
        self.tree.span(&self.tree.node(self.id).content)
    }

    /// Format spec of a dynamic value or code of a color tag.
    pub fn metadata(&self) -> Option<&'a str> {
        let node = self.tree.node(self.id);
        node.metadata.as_ref().map(|span| self.tree.span(span))
    }

    /// True for `$@key$` references.
    pub fn is_tooltip(&self) -> bool {
        self.tree.node(self.id).tooltip
    }

    /// The token exactly as written in the source.
    pub fn raw(&self) -> &'a str {
        self.tree.span(&self.tree.node(self.id).raw)
    }

    /// Byte range of the token within the source.
    pub fn raw_span(&self) -> Range<usize> {
        self.tree.node(self.id).raw.clone()
    }

    pub fn has_children(&self) -> bool {
        self.tree.node(self.id).first_child.is_some()
    }

    /// Child tokens in source order.
    pub fn children(&self) -> Children<'a> {
        Children {
            tree: self.tree,
            next: self.tree.node(self.id).first_child,
        }
    }
}

/// Iterator over the children of a [`Token`].
pub struct Children<'a> {
    tree: &'a TokenTree,
    next: Option<TokenId>,
}

impl<'a> Iterator for Children<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        self.next = self.tree.node(id).next_sibling;
        Some(Token {
            tree: self.tree,
            id,
        })
    }
}

/// Renders the tree one token per line, children indented by two spaces.
impl Display for TokenTree {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "Root")?;
        for child in self.root().children() {
            write_token(f, child, 1)?;
        }
        Ok(())
    }
}

fn write_token(f: &mut Formatter<'_>, token: Token<'_>, depth: usize) -> FmtResult {
    write!(f, "\n{:indent$}", "", indent = depth * 2)?;
    match token.kind() {
        TokenKind::Literal => write!(f, "Literal {:?}", token.content())?,
        TokenKind::KeyReference => {
            write!(f, "KeyReference {:?}", token.content())?;
            if token.is_tooltip() {
                write!(f, " tooltip")?;
            }
        }
        TokenKind::DynamicValue => {
            write!(f, "DynamicValue {:?}", token.content())?;
            if let Some(format) = token.metadata() {
                write!(f, " format {format:?}")?;
            }
        }
        TokenKind::ColorTag => {
            write!(f, "ColorTag {}", token.metadata().unwrap_or_default())?;
        }
    }
    for child in token.children() {
        write_token(f, child, depth + 1)?;
    }
    Ok(())
}
