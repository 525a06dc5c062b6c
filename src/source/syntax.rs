//! Document Parser — text to a generic nested-list tree.
//!
//! Tokenization is handled by logos; the tree is assembled with an explicit
//! stack of open lists rather than by recursive descent.

use logos::Logos;

use crate::error::FtlError;

#[derive(Logos, Debug, PartialEq, Clone, Copy)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r";[^\n]*")]
enum Token {
    #[token("(")]
    Open,
    #[token(")")]
    Close,
    #[token("'")]
    Quote,
    #[regex(r#""([^"\\]|\\.)*""#)]
    Str,
    // Symbols and numbers share one shape; `classify_atom` tells them apart.
    #[regex(r#"[^\s()'";]+"#)]
    Atom,
}

/// A parsed value: an atom, a list, or a quoted node.
#[derive(Debug, Clone, PartialEq)]
pub enum SyntaxNode {
    Symbol(String),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<SyntaxNode>),
    /// `'expr`: an inert annotation around a single inner node.
    Quoted(Box<SyntaxNode>),
}

impl SyntaxNode {
    /// Strip any quote markers. Unquoted nodes come back unchanged, so
    /// applying this twice is the same as applying it once.
    pub fn unquoted(&self) -> &SyntaxNode {
        let mut node = self;
        while let SyntaxNode::Quoted(inner) = node {
            node = inner;
        }
        node
    }

    pub fn as_list(&self) -> Option<&[SyntaxNode]> {
        match self.unquoted() {
            SyntaxNode::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self.unquoted() {
            SyntaxNode::Symbol(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_symbol(&self, name: &str) -> bool {
        self.as_symbol() == Some(name)
    }

    /// Short description used in error messages.
    pub fn kind(&self) -> &'static str {
        match self.unquoted() {
            SyntaxNode::Symbol(_) => "symbol",
            SyntaxNode::Int(_) => "integer",
            SyntaxNode::Float(_) => "float",
            SyntaxNode::Str(_) => "string",
            SyntaxNode::List(_) => "list",
            SyntaxNode::Quoted(_) => unreachable!("unquoted() strips every quote"),
        }
    }
}

/// Free-function form of [`SyntaxNode::unquoted`].
pub fn unwrap(node: &SyntaxNode) -> &SyntaxNode {
    node.unquoted()
}

/// Deepest allowed chain of open lists and quote markers. The tree is
/// dropped and compared recursively, so depth has to stay bounded.
pub const MAX_NESTING: usize = 256;

/// An open list waiting for its `)`.
struct OpenList {
    items: Vec<SyntaxNode>,
    /// Quote markers written before the `(`.
    quotes: usize,
    offset: usize,
}

/// Parse a document holding exactly one expression.
pub fn parse(source: &str) -> Result<SyntaxNode, FtlError> {
    let mut lexer = Token::lexer(source);
    let mut stack: Vec<OpenList> = Vec::new();
    let mut top: Vec<SyntaxNode> = Vec::new();
    // Quote markers seen at the current nesting level, not yet attached.
    let mut pending_quotes = 0usize;
    let mut last_quote_at = 0usize;
    // Open lists plus every quote marker wrapping them or still pending.
    let mut depth = 0usize;

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let token = match result {
            Ok(token) => token,
            Err(()) => {
                let reason = if lexer.slice().starts_with('"') {
                    "unterminated string literal".to_string()
                } else {
                    format!("invalid token {:?}", lexer.slice())
                };
                return Err(FtlError::malformed(source, span.start, reason));
            }
        };

        let node = match token {
            Token::Quote => {
                pending_quotes += 1;
                last_quote_at = span.start;
                depth += 1;
                if depth > MAX_NESTING {
                    return Err(too_deep(source, span.start));
                }
                continue;
            }
            Token::Open => {
                depth += 1;
                if depth > MAX_NESTING {
                    return Err(too_deep(source, span.start));
                }
                stack.push(OpenList {
                    items: Vec::new(),
                    quotes: pending_quotes,
                    offset: span.start,
                });
                pending_quotes = 0;
                continue;
            }
            Token::Close => {
                if pending_quotes > 0 {
                    return Err(FtlError::malformed(
                        source,
                        last_quote_at,
                        "quote marker is not followed by an expression",
                    ));
                }
                let Some(list) = stack.pop() else {
                    return Err(FtlError::malformed(source, span.start, "unexpected ')'"));
                };
                depth -= 1 + list.quotes;
                quote(SyntaxNode::List(list.items), list.quotes)
            }
            Token::Str => {
                let node = SyntaxNode::Str(unescape(lexer.slice()));
                depth -= pending_quotes;
                quote(node, std::mem::take(&mut pending_quotes))
            }
            Token::Atom => {
                let node = classify_atom(lexer.slice());
                depth -= pending_quotes;
                quote(node, std::mem::take(&mut pending_quotes))
            }
        };

        match stack.last_mut() {
            Some(open) => open.items.push(node),
            None => top.push(node),
        }
    }

    if let Some(open) = stack.last() {
        return Err(FtlError::malformed(source, open.offset, "unclosed '('"));
    }
    if pending_quotes > 0 {
        return Err(FtlError::malformed(
            source,
            last_quote_at,
            "quote marker is not followed by an expression",
        ));
    }

    let mut top = top.into_iter();
    match (top.next(), top.next()) {
        (Some(node), None) => Ok(node),
        (None, _) => Err(FtlError::malformed(source, source.len(), "empty document")),
        (Some(_), Some(_)) => Err(FtlError::malformed(
            source,
            trailing_offset(source),
            "unexpected expression after the document",
        )),
    }
}

fn too_deep(source: &str, offset: usize) -> FtlError {
    FtlError::malformed(
        source,
        offset,
        format!("nesting too deep (more than {MAX_NESTING} levels)"),
    )
}

fn quote(mut node: SyntaxNode, count: usize) -> SyntaxNode {
    for _ in 0..count {
        node = SyntaxNode::Quoted(Box::new(node));
    }
    node
}

/// Integers first, then floats; anything that does not start like a number
/// (`inf`, `nan`, `-`) stays a symbol.
fn classify_atom(text: &str) -> SyntaxNode {
    if looks_numeric(text) {
        if let Ok(i) = text.parse::<i64>() {
            return SyntaxNode::Int(i);
        }
        if let Ok(f) = text.parse::<f64>() {
            return SyntaxNode::Float(f);
        }
    }
    SyntaxNode::Symbol(text.to_string())
}

fn looks_numeric(text: &str) -> bool {
    let rest = text.strip_prefix(&['+', '-'][..]).unwrap_or(text);
    let rest = rest.strip_prefix('.').unwrap_or(rest);
    rest.starts_with(|c: char| c.is_ascii_digit())
}

fn unescape(literal: &str) -> String {
    let inner = &literal[1..literal.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// Offset of the first token after the first complete top-level expression.
fn trailing_offset(source: &str) -> usize {
    let mut lexer = Token::lexer(source);
    let mut depth = 0usize;
    let mut seen_first = false;
    while let Some(Ok(token)) = lexer.next() {
        if seen_first && depth == 0 {
            return lexer.span().start;
        }
        match token {
            Token::Open => depth += 1,
            Token::Close => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    seen_first = true;
                }
            }
            Token::Quote => {}
            Token::Str | Token::Atom => {
                if depth == 0 {
                    seen_first = true;
                }
            }
        }
    }
    source.len()
}
