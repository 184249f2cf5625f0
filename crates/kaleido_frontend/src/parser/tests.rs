use insta::assert_snapshot;
use kaleido_diagnostic::span::Span;
use kaleido_interner::Interner;

use super::{ErrorCategory, ParseErrorKind, Parser};
use crate::ast::*;
use crate::display::AstDisplay;
use crate::lexer::Lexer;
use crate::operators::{Assoc, OperatorInfo, OperatorTable};

/// Parses every unit in `source`, rendering each one or its error.
fn units_with(source: &str, operators: &mut OperatorTable) -> Vec<String> {
    let mut interner = Interner::new();
    let mut rendered = vec![];

    {
        let lexer = Lexer::new(source.chars(), &mut interner);
        let mut parser = Parser::new(lexer, operators);

        loop {
            match parser.parse_unit() {
                Ok(TopLevel::End) => break,
                Ok(unit) => rendered.push(unit.display(parser.interner()).to_string()),
                Err(err) => rendered.push(format!("error: {}", err.kind)),
            }
        }
    }

    rendered
}

fn units(source: &str) -> Vec<String> {
    units_with(source, &mut OperatorTable::new())
}

fn expr(source: &str) -> String {
    let mut rendered = units(source);
    assert_eq!(rendered.len(), 1, "{rendered:?}");
    rendered.remove(0)
}

fn parse_one(source: &str) -> (TopLevel, Interner) {
    let mut interner = Interner::new();
    let mut operators = OperatorTable::new();

    let lexer = Lexer::new(source.chars(), &mut interner);
    let unit = Parser::new(lexer, &mut operators)
        .parse_unit()
        .expect("source should parse");

    (unit, interner)
}

#[test]
fn multiplication_binds_tighter() {
    assert_snapshot!(expr("a + b * c"), @"(expr (+ a (* b c)))");
    assert_snapshot!(expr("a * b + c"), @"(expr (+ (* a b) c))");
}

#[test]
fn subtraction_is_left_associative() {
    assert_snapshot!(expr("a - b - c"), @"(expr (- (- a b) c))");
}

#[test]
fn comparison_binds_loosest() {
    assert_snapshot!(expr("a < b + c"), @"(expr (< a (+ b c)))");
    assert_snapshot!(expr("a < b * c + d"), @"(expr (< a (+ (* b c) d)))");
    assert_snapshot!(expr("a + b * c - d"), @"(expr (- (+ a (* b c)) d))");
}

#[test]
fn parentheses_group() {
    assert_snapshot!(expr("(a + b) * c"), @"(expr (* (+ a b) c))");
}

#[test]
fn mixed_precedence_chain() {
    assert_snapshot!(expr("a + b * c - d < e"), @"(expr (< (- (+ a (* b c)) d) e))");
}

#[test]
fn unary_binds_tighter_than_binary() {
    assert_snapshot!(expr("-a * b"), @"(expr (* (- a) b))");
    assert_snapshot!(expr("a - -b"), @"(expr (- a (- b)))");
    assert_snapshot!(expr("!!a + b"), @"(expr (+ (! (! a)) b))");
}

#[test]
fn calls() {
    assert_snapshot!(expr("f(1, g(x), 3)"), @"(expr (call f 1 (call g x) 3))");
    assert_snapshot!(expr("f()"), @"(expr (call f))");
}

#[test]
fn if_with_and_without_else() {
    assert_snapshot!(expr("if a then b else c"), @"(expr (if a b c))");
    assert_snapshot!(expr("if a then b"), @"(expr (if a b))");

    let (unit, _) = parse_one("if a then b");
    let body = unit.unit().and_then(|unit| unit.body.as_ref()).unwrap();
    assert!(matches!(body.kind, ExprKind::If { else_: None, .. }));
}

#[test]
fn for_with_explicit_step() {
    assert_snapshot!(expr("for i = 0, 10, 2 in body"), @"(expr (for i 0 10 2 body))");
}

#[test]
fn for_with_implicit_step() {
    assert_snapshot!(expr("for i = 0, 10 in body"), @"(expr (for i 0 10 1 body))");

    let (unit, _) = parse_one("for i = 0, 10 in body");
    let body = unit.unit().and_then(|unit| unit.body.as_ref()).unwrap();
    let ExprKind::For { step, .. } = &body.kind else {
        panic!("expected a for loop, got {body:?}");
    };

    assert_eq!(step.kind, ExprKind::Number(1.0));
    assert_eq!(step.span, Span::empty(14));
}

#[test]
fn definitions_and_externs() {
    assert_eq!(
        units("def foo(x y) x * y; extern sin(x); foo(1, 2)"),
        [
            "(def foo(x y) (* x y))",
            "<empty>",
            "(extern sin(x))",
            "<empty>",
            "(expr (call foo 1 2))",
        ]
    );
}

#[test]
fn duplicate_parameters_parse() {
    assert_snapshot!(expr("def foo(x x) x"), @"(def foo(x x) x)");
}

#[test]
fn anonymous_prototype() {
    let (unit, interner) = parse_one("1 + 2");

    let TopLevel::Expression(unit) = unit else {
        panic!("expected an expression, got {unit:?}");
    };

    assert_eq!(unit.proto.kind, ProtoKind::Anonymous);
    assert_eq!(interner.resolve(unit.proto.name), ANON_FN_NAME);
    assert!(unit.proto.params.is_empty());
}

#[test]
fn operator_prototypes() {
    let (unit, interner) = parse_one("def unary!(v) if v then 0 else 1");
    let proto = &unit.unit().unwrap().proto;
    assert_eq!(proto.kind, ProtoKind::Unary('!'));
    assert_eq!(interner.resolve(proto.name), "unary!");

    let (unit, interner) = parse_one("def binary| 5 (a b) a");
    let proto = &unit.unit().unwrap().proto;
    assert_eq!(
        proto.kind,
        ProtoKind::Binary {
            op: '|',
            info: OperatorInfo::new(5, Assoc::Left)
        }
    );
    assert_eq!(interner.resolve(proto.name), "binary|");
}

#[test]
fn user_operator_is_unknown_before_definition() {
    assert_eq!(
        units("a $ b $ c"),
        [
            "error: unknown binary operator `$`",
            "error: unknown binary operator `$`",
            "(expr c)",
        ]
    );
}

#[test]
fn right_associative_user_operator() {
    let mut operators = OperatorTable::new();

    assert_eq!(
        units_with("def binary$ 5 right (a b) a; a $ b $ c", &mut operators),
        [
            "(def binary$(a b) [5 right] a)",
            "<empty>",
            "(expr ($ a ($ b c)))",
        ]
    );
    assert_eq!(operators.get('$'), Some(OperatorInfo::new(5, Assoc::Right)));
}

#[test]
fn user_operator_precedence_against_builtins() {
    assert_eq!(
        units("def binary: 1 (x y) y; a + b : c : d * e"),
        [
            "(def binary:(x y) [1 left] y)",
            "<empty>",
            "(expr (: (: (+ a b) c) (* d e)))",
        ]
    );
}

#[test]
fn operator_is_usable_in_its_own_body() {
    assert_snapshot!(
        units("def binary& 6 (a b) if a then b & 0 else 0").join("\n"),
        @"(def binary&(a b) [6 left] (if a (& b 0) 0))"
    );
}

#[test]
fn invalid_precedence_recovers_one_token() {
    let mut operators = OperatorTable::new();

    assert_eq!(
        units_with("def binary ! 150 (a b) a; 4;", &mut operators),
        [
            "error: invalid precedence `150`: must be an integer from 1 to 100",
            "error: expected `)`, found identifier",
            "error: expected an expression, found `)`",
            "(expr a)",
            "<empty>",
            "(expr 4)",
            "<empty>",
        ]
    );
    assert_eq!(operators.get('!'), None);
}

#[test]
fn fractional_precedence_is_invalid() {
    assert_eq!(
        units("def binary% 5.5 (a b) a")[0],
        "error: invalid precedence `5.5`: must be an integer from 1 to 100"
    );
}

#[test]
fn invalid_associativity() {
    assert_eq!(
        units("def binary% 5 middle (a b) a")[0],
        "error: invalid associativity `middle`: must be `left` or `right`"
    );
}

#[test]
fn operator_arity_is_checked() {
    assert_eq!(
        units("def binary| 5 (a) a")[0],
        "error: binary operator `|` takes 2 operand(s), found 1"
    );
    assert_eq!(
        units("def unary!(a b) a")[0],
        "error: unary operator `!` takes 1 operand(s), found 2"
    );
}

#[test]
fn builtin_symbols_are_not_definable() {
    assert_eq!(
        units("def binary+ 5 (a b) a")[0],
        "error: expected a binary operator symbol, found operator `+`"
    );
}

#[test]
fn missing_then() {
    assert_eq!(
        units("if x else y")[0],
        "error: expected keyword `then`, found keyword `else`"
    );
}

#[test]
fn unexpected_end_of_input() {
    assert_eq!(
        units("f(1,"),
        ["error: expected an expression, found end of input"]
    );
}

#[test]
fn bad_argument_separator() {
    assert_eq!(
        units("f(1 2)")[0],
        "error: expected `)` or `,` in argument list, found number"
    );
}

#[test]
fn error_categories() {
    let mut interner = Interner::new();
    let mut operators = OperatorTable::new();
    let lexer = Lexer::new("a ~ b; )".chars(), &mut interner);
    let mut parser = Parser::new(lexer, &mut operators);

    let unknown = parser.parse_unit().unwrap_err();
    assert_eq!(unknown.kind, ParseErrorKind::UnknownOperator('~'));
    assert_eq!(unknown.category(), ErrorCategory::UnknownOperator);
    assert_eq!(unknown.span, Span::new(2, 3));

    // `b`, `;`
    parser.parse_unit().unwrap();
    parser.parse_unit().unwrap();

    let syntax = parser.parse_unit().unwrap_err();
    assert_eq!(syntax.category(), ErrorCategory::SyntaxError);
    assert!(matches!(parser.parse_unit(), Ok(TopLevel::End)));
}

#[test]
fn restore_operators() {
    let mut interner = Interner::new();
    let mut operators = OperatorTable::new();
    let lexer = Lexer::new("def binary| 5 (a b) a".chars(), &mut interner);
    let mut parser = Parser::new(lexer, &mut operators);

    let checkpoint = parser.operators().clone();
    parser.parse_unit().unwrap();
    assert!(parser.operators().get('|').is_some());

    parser.restore_operators(checkpoint);
    assert!(parser.operators().get('|').is_none());
}
