#[cfg(test)]
mod tests;

mod expr;

use std::borrow::Cow;

use kaleido_interner::{Interner, Symbol};
use kaleido_session::diagnostics::prelude::*;

use crate::ast::*;
use crate::lexer::Lexer;
use crate::operators::*;
use crate::token::{Keyword, Token, TokenKind};

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ParseErrorKind {
    #[error("expected {expected}, found {found}")]
    Expected {
        expected: Cow<'static, str>,
        found: Cow<'static, str>,
    },

    #[error("invalid precedence `{0}`: must be an integer from 1 to 100")]
    InvalidPrecedence(String),

    #[error("invalid associativity `{0}`: must be `left` or `right`")]
    InvalidAssociativity(String),

    #[error("{} operator `{op}` takes {} operand(s), found {found}", .fixity.as_str(), .fixity.arity())]
    OperatorArity {
        fixity: OperatorFixity,
        op: char,
        found: usize,
    },

    #[error("unknown binary operator `{0}`")]
    UnknownOperator(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    SyntaxError,
    UnknownOperator,
}

impl ErrorCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCategory::SyntaxError => "syntax error",
            ErrorCategory::UnknownOperator => "unknown operator",
        }
    }
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn category(&self) -> ErrorCategory {
        match self.kind {
            ParseErrorKind::UnknownOperator(_) => ErrorCategory::UnknownOperator,
            _ => ErrorCategory::SyntaxError,
        }
    }
}

impl IntoDiagnostic<SourceId> for ParseError {
    fn into_diagnostic(self, source_id: &SourceId) -> Diagnostic {
        let diagnostic = Diagnostic::error()
            .with_message(self.category().as_str())
            .with_snippet(Snippet::primary(
                self.kind.to_string(),
                *source_id,
                self.span,
            ));

        match self.kind {
            ParseErrorKind::UnknownOperator(op) => diagnostic.with_note(format!(
                "define it first, e.g. `def binary{op} 10 (lhs rhs) ...`"
            )),
            _ => diagnostic,
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Parses one top-level unit at a time.
///
/// Binary operator definitions are registered in the borrowed
/// [`OperatorTable`] as soon as their prototype is parsed.
pub struct Parser<'cx, I: Iterator<Item = char>> {
    lexer: Lexer<'cx, I>,
    operators: &'cx mut OperatorTable,

    prev_span: Span,
    anon_name: Symbol,
}

impl<'cx, I: Iterator<Item = char>> Parser<'cx, I> {
    pub fn new(mut lexer: Lexer<'cx, I>, operators: &'cx mut OperatorTable) -> Self {
        let anon_name = lexer.interner_mut().intern(ANON_FN_NAME);
        lexer.advance();

        Self {
            lexer,
            operators,

            prev_span: Span::empty(0),
            anon_name,
        }
    }

    /// Parse the next top-level unit.
    ///
    /// On error exactly one token, the one the parser stopped at, is
    /// discarded so the next call makes progress.
    pub fn parse_unit(&mut self) -> ParseResult<TopLevel> {
        let result = self.parse_top_level();

        if result.is_err() {
            self.advance();
        }

        result
    }

    pub fn interner(&self) -> &Interner {
        self.lexer.interner()
    }

    pub fn lexer(&self) -> &Lexer<'cx, I> {
        &self.lexer
    }

    pub fn operators(&self) -> &OperatorTable {
        &*self.operators
    }

    pub fn restore_operators(&mut self, operators: OperatorTable) {
        *self.operators = operators;
    }

    fn parse_top_level(&mut self) -> ParseResult<TopLevel> {
        let token = self.current();

        match token.kind {
            TokenKind::Eof => Ok(TopLevel::End),

            TokenKind::Semicolon => {
                self.advance();
                Ok(TopLevel::Empty)
            }

            TokenKind::Keyword(Keyword::Def) => {
                self.advance();

                let proto = self.parse_prototype()?;
                let body = self.parse_expr()?;

                Ok(TopLevel::Definition(FunctionUnit {
                    proto,
                    body: Some(body),
                }))
            }

            TokenKind::Keyword(Keyword::Extern) => {
                self.advance();

                let proto = self.parse_prototype()?;

                Ok(TopLevel::Extern(FunctionUnit { proto, body: None }))
            }

            _ => {
                let body = self.parse_expr()?;
                let proto = Prototype {
                    name: self.anon_name,
                    params: vec![],
                    kind: ProtoKind::Anonymous,
                    span: Span::empty(body.span.start),
                };

                Ok(TopLevel::Expression(FunctionUnit {
                    proto,
                    body: Some(body),
                }))
            }
        }
    }

    fn parse_prototype(&mut self) -> ParseResult<Prototype> {
        let start = self.current().span;

        let (name, kind) = match self.current().kind {
            TokenKind::Identifier(name) => {
                self.advance();
                (name, ProtoKind::Function)
            }

            TokenKind::Keyword(Keyword::Unary) => {
                self.advance();

                let op = self.parse_operator_symbol(OperatorFixity::Unary)?;
                let name = self.operator_fn_symbol(OperatorFixity::Unary, op);

                (name, ProtoKind::Unary(op))
            }

            TokenKind::Keyword(Keyword::Binary) => {
                self.advance();

                let op = self.parse_operator_symbol(OperatorFixity::Binary)?;
                let precedence = self.parse_precedence()?;
                let assoc = self.parse_assoc()?;
                let name = self.operator_fn_symbol(OperatorFixity::Binary, op);

                let info = OperatorInfo::new(precedence, assoc);
                (name, ProtoKind::Binary { op, info })
            }

            _ => return Err(self.error_expected("a function name", self.current())),
        };

        self.expect(TokenKind::LParen)?;

        let mut params = vec![];
        while let TokenKind::Identifier(param) = self.current().kind {
            params.push(param);
            self.advance();
        }

        self.expect(TokenKind::RParen)?;

        let span = start.union(self.prev_span);

        let fixity = match kind {
            ProtoKind::Unary(op) => Some((OperatorFixity::Unary, op)),
            ProtoKind::Binary { op, .. } => Some((OperatorFixity::Binary, op)),
            ProtoKind::Function | ProtoKind::Anonymous => None,
        };

        if let Some((fixity, op)) = fixity {
            if params.len() != fixity.arity() {
                return Err(ParseError::new(
                    ParseErrorKind::OperatorArity {
                        fixity,
                        op,
                        found: params.len(),
                    },
                    span,
                ));
            }
        }

        if let ProtoKind::Binary { op, info } = kind {
            self.operators.register(op, info);
        }

        Ok(Prototype {
            name,
            params,
            kind,
            span,
        })
    }

    fn parse_operator_symbol(&mut self, fixity: OperatorFixity) -> ParseResult<char> {
        match self.current().kind {
            TokenKind::Op(op) if is_definable_operator(op) => {
                self.advance();
                Ok(op)
            }

            _ => {
                let expected = match fixity {
                    OperatorFixity::Unary => "a unary operator symbol",
                    OperatorFixity::Binary => "a binary operator symbol",
                };
                Err(self.error_expected(expected, self.current()))
            }
        }
    }

    fn parse_precedence(&mut self) -> ParseResult<u8> {
        let token = self.current();

        if !matches!(token.kind, TokenKind::Number(_)) {
            return Err(self.error_expected("an operator precedence", token));
        }

        let lexeme = self.lexer.lexeme(token.span);
        let precedence = lexeme
            .parse::<u8>()
            .ok()
            .filter(|precedence| USER_PRECEDENCE.contains(precedence))
            .ok_or_else(|| {
                ParseError::new(
                    ParseErrorKind::InvalidPrecedence(lexeme.to_owned()),
                    token.span,
                )
            })?;

        self.advance();

        Ok(precedence)
    }

    fn parse_assoc(&mut self) -> ParseResult<Assoc> {
        let token = self.current();

        let TokenKind::Identifier(name) = token.kind else {
            return Ok(Assoc::default());
        };

        let assoc = match self.interner().resolve(name) {
            "left" => Assoc::Left,
            "right" => Assoc::Right,
            other => {
                return Err(ParseError::new(
                    ParseErrorKind::InvalidAssociativity(other.to_owned()),
                    token.span,
                ))
            }
        };

        self.advance();

        Ok(assoc)
    }

    fn parse_ident(&mut self) -> ParseResult<(Symbol, Span)> {
        match self.current() {
            Token {
                kind: TokenKind::Identifier(name),
                span,
            } => {
                self.advance();
                Ok((name, span))
            }

            other => Err(self.error_expected("an identifier", other)),
        }
    }

    fn operator_fn_symbol(&mut self, fixity: OperatorFixity, op: char) -> Symbol {
        let name = operator_fn_name(fixity, op);
        self.lexer.interner_mut().intern(&name)
    }

    fn current(&self) -> Token {
        self.lexer.current()
    }

    fn advance(&mut self) -> Token {
        let prev = self.lexer.current();
        self.prev_span = prev.span;
        self.lexer.advance();
        prev
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<Token> {
        let token = self.current();

        if token.kind == kind {
            self.advance();
            Ok(token)
        } else {
            Err(self.error_expected_kind(kind, token))
        }
    }

    fn eat_kind(&mut self, kind: TokenKind) -> bool {
        if self.current().kind == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error_expected_kind(&self, kind: TokenKind, found: Token) -> ParseError {
        self.error_expected(kind.token_name(), found)
    }

    fn error_expected(&self, expected: impl Into<Cow<'static, str>>, found: Token) -> ParseError {
        ParseError::new(
            ParseErrorKind::Expected {
                expected: expected.into(),
                found: found.kind.token_name(),
            },
            found.span,
        )
    }
}
