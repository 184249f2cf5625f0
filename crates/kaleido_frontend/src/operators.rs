//! The table of binary operators known to the parser.
//!
//! The table starts out with the built-in arithmetic and comparison operators
//! and grows as user-defined binary operators are parsed.

use std::collections::HashMap;
use std::ops::RangeInclusive;

use crate::token::{Token, TokenKind};

/// Precedences a user-defined binary operator may declare.
pub const USER_PRECEDENCE: RangeInclusive<u8> = 1..=100;

/// Precedence reported for tokens that are not binary operators. Lower than
/// every real precedence, so precedence climbing stops on it.
pub const NOT_AN_OPERATOR: i32 = -1;

const BUILTINS: [(char, OperatorInfo); 5] = [
    ('<', OperatorInfo::new(10, Assoc::Left)),
    ('+', OperatorInfo::new(20, Assoc::Left)),
    ('-', OperatorInfo::new(20, Assoc::Left)),
    ('*', OperatorInfo::new(40, Assoc::Left)),
    ('/', OperatorInfo::new(40, Assoc::Left)),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Assoc {
    #[default]
    Left,
    Right,
}

impl Assoc {
    pub fn as_str(self) -> &'static str {
        match self {
            Assoc::Left => "left",
            Assoc::Right => "right",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperatorInfo {
    pub precedence: u8,
    pub assoc: Assoc,
}

impl OperatorInfo {
    pub const fn new(precedence: u8, assoc: Assoc) -> Self {
        Self { precedence, assoc }
    }

    /// Like [`OperatorInfo::new`], but only for precedences in
    /// [`USER_PRECEDENCE`].
    pub fn user(precedence: u8, assoc: Assoc) -> Option<Self> {
        USER_PRECEDENCE
            .contains(&precedence)
            .then_some(Self::new(precedence, assoc))
    }
}

#[derive(Debug, Clone)]
pub struct OperatorTable {
    operators: HashMap<char, OperatorInfo>,
}

impl Default for OperatorTable {
    fn default() -> Self {
        Self::new()
    }
}

impl OperatorTable {
    pub fn new() -> Self {
        Self {
            operators: HashMap::from(BUILTINS),
        }
    }

    pub fn get(&self, op: char) -> Option<OperatorInfo> {
        self.operators.get(&op).copied()
    }

    pub fn lookup(&self, token: &Token) -> Option<OperatorInfo> {
        match token.kind {
            TokenKind::Op(op) => self.get(op),
            _ => None,
        }
    }

    /// The binding strength of `token` in binary position, or
    /// [`NOT_AN_OPERATOR`].
    pub fn precedence(&self, token: &Token) -> i32 {
        self.lookup(token)
            .map_or(NOT_AN_OPERATOR, |info| i32::from(info.precedence))
    }

    /// Add or replace an operator, returning the entry it shadows.
    pub fn register(&mut self, op: char, info: OperatorInfo) -> Option<OperatorInfo> {
        self.operators.insert(op, info)
    }

    pub fn is_builtin(op: char) -> bool {
        BUILTINS.iter().any(|&(builtin, _)| builtin == op)
    }
}

/// Symbols that may name a user-defined operator.
pub fn is_definable_operator(ch: char) -> bool {
    matches!(
        ch,
        '!' | '@' | ':' | '#' | '$' | '%' | '^' | '&' | '|' | '.' | '?' | '~' | '>'
    )
}

/// Symbols that may appear in prefix position.
pub fn is_unary_operator(ch: char) -> bool {
    ch == '-' || is_definable_operator(ch)
}

#[cfg(test)]
mod tests {
    use kaleido_diagnostic::span::Span;

    use super::*;

    fn op(ch: char) -> Token {
        Token {
            kind: TokenKind::Op(ch),
            span: Span::new(0, 1),
        }
    }

    #[test]
    fn builtins_are_seeded() {
        let table = OperatorTable::new();

        assert_eq!(table.precedence(&op('<')), 10);
        assert_eq!(table.precedence(&op('+')), 20);
        assert_eq!(table.precedence(&op('-')), 20);
        assert_eq!(table.precedence(&op('*')), 40);
        assert_eq!(table.precedence(&op('/')), 40);
        assert!(['<', '+', '-', '*', '/']
            .into_iter()
            .all(|op| table.get(op).is_some_and(|info| info.assoc == Assoc::Left)));
    }

    #[test]
    fn non_operators_have_sentinel_precedence() {
        let table = OperatorTable::new();

        assert_eq!(table.precedence(&op('$')), NOT_AN_OPERATOR);
        assert_eq!(table.precedence(&Token::eof(0)), NOT_AN_OPERATOR);
    }

    #[test]
    fn register_shadows() {
        let mut table = OperatorTable::new();
        let dollar = OperatorInfo::new(5, Assoc::Right);

        assert_eq!(table.register('$', dollar), None);
        assert_eq!(table.lookup(&op('$')), Some(dollar));

        let replaced = table.register('+', OperatorInfo::new(70, Assoc::Left));
        assert_eq!(replaced, Some(OperatorInfo::new(20, Assoc::Left)));
        assert_eq!(table.precedence(&op('+')), 70);
    }

    #[test]
    fn checkpoints_are_independent() {
        let mut table = OperatorTable::new();
        let checkpoint = table.clone();

        table.register('|', OperatorInfo::new(5, Assoc::Left));

        assert!(table.get('|').is_some());
        assert!(checkpoint.get('|').is_none());
    }

    #[test]
    fn user_precedence_range() {
        assert_eq!(OperatorInfo::user(0, Assoc::Left), None);
        assert!(OperatorInfo::user(1, Assoc::Left).is_some());
        assert!(OperatorInfo::user(100, Assoc::Right).is_some());
        assert_eq!(OperatorInfo::user(101, Assoc::Left), None);
    }

    #[test]
    fn symbol_classes() {
        assert!(is_definable_operator('|'));
        assert!(is_definable_operator('>'));
        assert!(!is_definable_operator('-'));
        assert!(!is_definable_operator('+'));
        assert!(is_unary_operator('-'));
        assert!(is_unary_operator('!'));
        assert!(!is_unary_operator('*'));
    }
}
