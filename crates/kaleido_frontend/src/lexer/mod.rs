
use std::collections::VecDeque;

use kaleido_interner::Interner;
use kaleido_session::diagnostics::prelude::*;

use crate::token::*;

/// Pull-based lexer over a character stream.
///
/// Characters are consumed lazily, so the lexer can sit on top of an
/// interactive input that is still being typed. Everything consumed so far is
/// kept in [`Lexer::text`] so spans can be resolved back to source text.
pub struct Lexer<'cx, I: Iterator<Item = char>> {
    interner: &'cx mut Interner,

    chars: I,
    lookahead: VecDeque<char>,
    text: String,

    token_start: usize,
    current: Token,
}

impl<'cx, I: Iterator<Item = char>> Lexer<'cx, I> {
    pub fn new(chars: I, interner: &'cx mut Interner) -> Self {
        Self {
            interner,

            chars,
            lookahead: VecDeque::with_capacity(2),
            text: String::new(),

            token_start: 0,
            current: Token::eof(0),
        }
    }

    /// The most recently lexed token.
    pub fn current(&self) -> Token {
        self.current
    }

    /// Lex the next token and make it current.
    pub fn advance(&mut self) -> Token {
        self.current = self.lex_token();
        self.current
    }

    pub fn lexeme(&self, span: Span) -> &str {
        self.text.get(span.start..span.end).unwrap_or_default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn interner(&self) -> &Interner {
        &*self.interner
    }

    pub fn interner_mut(&mut self) -> &mut Interner {
        &mut *self.interner
    }

    fn lex_token(&mut self) -> Token {
        while self.peek_char().is_some_and(|ch| ch.is_ascii_whitespace()) {
            self.next_char();
        }

        self.token_start = self.byte_pos();

        let Some(ch) = self.next_char() else {
            return Token::eof(self.byte_pos());
        };

        let kind = match ch {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            '=' => TokenKind::Assign,

            '0'..='9' => self.lex_number(),

            ch if is_ident_start(ch) => self.lex_alpha(),

            ch => TokenKind::Op(ch),
        };

        Token {
            kind,
            span: Span::new(self.token_start, self.byte_pos()),
        }
    }

    fn lex_number(&mut self) -> TokenKind {
        self.eat_digits();

        // A trailing `.` with no digits after it is left for the next token.
        if self.peek_char() == Some('.') && self.peek_nth(1).is_some_and(|ch| ch.is_ascii_digit())
        {
            self.next_char();
            self.eat_digits();
        }

        let s = &self.text[self.token_start..];
        let value = s.parse().expect("digit sequence should be a valid float");

        TokenKind::Number(value)
    }

    fn lex_alpha(&mut self) -> TokenKind {
        while self.peek_char().is_some_and(is_ident) {
            self.next_char();
        }

        let s = &self.text[self.token_start..];

        match Keyword::from_ident(s) {
            Some(kw) => TokenKind::Keyword(kw),
            None => TokenKind::Identifier(self.interner.intern(s)),
        }
    }

    fn eat_digits(&mut self) {
        while self.peek_char().is_some_and(|ch| ch.is_ascii_digit()) {
            self.next_char();
        }
    }

    fn peek_char(&mut self) -> Option<char> {
        self.peek_nth(0)
    }

    fn peek_nth(&mut self, n: usize) -> Option<char> {
        while self.lookahead.len() <= n {
            let ch = self.chars.next()?;
            self.lookahead.push_back(ch);
        }

        self.lookahead.get(n).copied()
    }

    fn next_char(&mut self) -> Option<char> {
        let ch = self.lookahead.pop_front().or_else(|| self.chars.next())?;
        self.text.push(ch);
        Some(ch)
    }

    fn byte_pos(&self) -> usize {
        self.text.len()
    }
}

/// Yields tokens up to, but not including, the end of input.
impl<I: Iterator<Item = char>> Iterator for Lexer<'_, I> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        match self.advance() {
            Token {
                kind: TokenKind::Eof,
                ..
            } => None,
            token => Some(token),
        }
    }
}

fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_ident(ch: char) -> bool {
    is_ident_start(ch)
}
