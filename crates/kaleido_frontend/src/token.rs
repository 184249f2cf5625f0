use std::borrow::Cow;

use kaleido_diagnostic::span::Span;
use kaleido_interner::Symbol;

use crate::NodeCopy;

#[derive(NodeCopy!)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn eof(at: usize) -> Self {
        Self {
            kind: TokenKind::Eof,
            span: Span::empty(at),
        }
    }
}

#[derive(NodeCopy!)]
pub enum TokenKind {
    Number(f64),
    Identifier(Symbol),
    Keyword(Keyword),

    LParen,
    RParen,
    Comma,
    Semicolon,
    Assign,

    /// Any other single character. Whether it names a usable operator is
    /// decided by the parser.
    Op(char),

    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Def,
    Extern,

    If,
    Then,
    Else,

    For,
    In,

    Binary,
    Unary,
}

impl Keyword {
    pub fn from_ident(s: &str) -> Option<Self> {
        let kw = match s {
            "def" => Self::Def,
            "extern" => Self::Extern,
            "if" => Self::If,
            "then" => Self::Then,
            "else" => Self::Else,
            "for" => Self::For,
            "in" => Self::In,
            "binary" => Self::Binary,
            "unary" => Self::Unary,
            _ => return None,
        };

        Some(kw)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Def => "def",
            Self::Extern => "extern",
            Self::If => "if",
            Self::Then => "then",
            Self::Else => "else",
            Self::For => "for",
            Self::In => "in",
            Self::Binary => "binary",
            Self::Unary => "unary",
        }
    }
}

impl TokenKind {
    pub fn token_name(&self) -> Cow<'static, str> {
        match self {
            TokenKind::Number(_) => "number".into(),
            TokenKind::Identifier(_) => "identifier".into(),
            TokenKind::Keyword(kw) => format!("keyword `{}`", kw.as_str()).into(),
            TokenKind::LParen => "`(`".into(),
            TokenKind::RParen => "`)`".into(),
            TokenKind::Comma => "`,`".into(),
            TokenKind::Semicolon => "`;`".into(),
            TokenKind::Assign => "`=`".into(),
            TokenKind::Op(op) => format!("operator `{op}`").into(),
            TokenKind::Eof => "end of input".into(),
        }
    }
}
