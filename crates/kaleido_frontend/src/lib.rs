#[macro_use]
extern crate macro_rules_attribute;

pub mod ast;
pub mod display;
pub mod lexer;
pub mod operators;
pub mod parser;
pub mod token;

pub use lexer::Lexer;
pub use operators::{Assoc, OperatorInfo, OperatorTable};
pub use parser::{ErrorCategory, ParseError, ParseErrorKind, ParseResult, Parser};

derive_alias! {
    #[derive(Node!)] = #[derive(Debug, Clone, PartialEq)];
    #[derive(NodeCopy!)] = #[derive(Debug, Clone, Copy, PartialEq)];
}
