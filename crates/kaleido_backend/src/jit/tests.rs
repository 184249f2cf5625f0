use kaleido_frontend::ast::{TopLevel, ANON_FN_NAME};
use kaleido_frontend::{Lexer, OperatorTable, Parser};
use kaleido_interner::Interner;

use super::JitBackend;
use crate::{Backend, BackendError};

struct Jit {
    interner: Interner,
    operators: OperatorTable,
    backend: JitBackend,
}

impl Jit {
    fn new() -> Self {
        Self {
            interner: Interner::new(),
            operators: OperatorTable::new(),
            backend: JitBackend::new().expect("host should be supported"),
        }
    }

    /// Compiles every unit, rendering `ok` for definitions and externs,
    /// `=> value` for expressions and `error: ...` for rejections.
    fn eval(&mut self, source: &str) -> Vec<String> {
        let lexer = Lexer::new(source.chars(), &mut self.interner);
        let mut parser = Parser::new(lexer, &mut self.operators);
        let mut results = vec![];

        loop {
            let unit = match parser.parse_unit() {
                Ok(TopLevel::End) => break,
                Ok(unit) => unit,
                Err(err) => {
                    results.push(format!("parse error: {}", err.kind));
                    continue;
                }
            };

            let Some(function) = unit.unit() else {
                continue;
            };

            let compiled = self.backend.compile_function(function, parser.interner());
            let result = match unit {
                TopLevel::Expression(_) => compiled
                    .and_then(|artifact| self.backend.invoke(&artifact))
                    .map(|value| format!("=> {value}")),
                _ => compiled.map(|_| "ok".to_owned()),
            };

            results.push(result.unwrap_or_else(|err| format!("error: {err}")));
        }

        results
    }
}

fn eval(source: &str) -> Vec<String> {
    Jit::new().eval(source)
}

#[test]
fn call_defined_function() {
    assert_eq!(eval("def f(x) x + 1; f(2)"), ["ok", "=> 3"]);
}

#[test]
fn arithmetic() {
    assert_eq!(
        eval("1 + 2 * 3; (1 + 2) * 3; 7 / 2; 2 - 5"),
        ["=> 7", "=> 9", "=> 3.5", "=> -3"]
    );
}

#[test]
fn comparison_yields_one_or_zero() {
    assert_eq!(eval("1 < 2; 2 < 1; 1 < 1"), ["=> 1", "=> 0", "=> 0"]);
}

#[test]
fn conditionals() {
    assert_eq!(
        eval("if 0 then 1 else 2; if 3 then 5; if 0 then 5"),
        ["=> 2", "=> 5", "=> 0"]
    );
}

#[test]
fn recursion() {
    assert_eq!(
        eval("def fib(x) if x < 3 then 1 else fib(x - 1) + fib(x - 2); fib(10)"),
        ["ok", "=> 55"]
    );
}

#[test]
fn for_loop_yields_zero() {
    assert_eq!(eval("for i = 0, i < 10 in i"), ["=> 0"]);
}

#[test]
fn loop_variable_shadows_parameter() {
    assert_eq!(
        eval("def g(i) (for i = 0, i < 3 in i) + i; g(7)"),
        ["ok", "=> 7"]
    );
}

#[test]
fn loop_variable_is_scoped_to_loop() {
    assert_eq!(
        eval("(for i = 0, i < 3 in i) + i"),
        ["error: unknown variable `i`"]
    );
}

#[test]
fn unary_minus_falls_back_to_negation() {
    assert_eq!(eval("-(3); --4"), ["=> -3", "=> 4"]);
}

#[test]
fn user_defined_operators() {
    assert_eq!(
        eval(
            "def unary!(v) if v then 0 else 1;
             def binary| 5 (a b) if a then 1 else if b then 1 else 0;
             !0; !3; 0 | 1; 0 | 0"
        ),
        ["ok", "ok", "=> 1", "=> 0", "=> 1", "=> 0"]
    );
}

#[test]
fn right_associative_operator() {
    assert_eq!(
        eval("def binary^ 50 right (x y) x - y; 10 ^ 4 ^ 3"),
        ["ok", "=> 9"]
    );
}

#[test]
fn undefined_unary_operator() {
    assert_eq!(eval("~1"), ["error: unknown unary operator `~`"]);
}

#[test]
fn unknown_function() {
    assert_eq!(eval("g(1)"), ["error: unknown function `g`"]);
}

#[test]
fn call_arity_mismatch() {
    assert_eq!(
        eval("def f(x) x; f(1, 2)"),
        ["ok", "error: function `f` takes 1 argument(s), found 2"]
    );
}

#[test]
fn failed_definition_leaves_no_trace() {
    let mut jit = Jit::new();

    assert_eq!(
        jit.eval("def f(x) y; f(1)"),
        [
            "error: unknown variable `y`",
            "error: unknown function `f`",
        ]
    );

    let f = jit.interner.find("f").unwrap();
    assert_eq!(jit.backend.lookup_arity(f), None);

    assert_eq!(jit.eval("def f(a b) a + b; f(1, 2)"), ["ok", "=> 3"]);
    assert_eq!(jit.backend.lookup_arity(f), Some(2));
}

#[test]
fn failed_definition_retried_with_same_arity() {
    assert_eq!(
        eval("def f(x) y; def f(a) a * 2; f(4)"),
        ["error: unknown variable `y`", "ok", "=> 8"]
    );
}

#[test]
fn failed_definition_keeps_extern_declaration() {
    let mut jit = Jit::new();

    assert_eq!(
        jit.eval("extern f(x); def f(x) y;"),
        ["ok", "error: unknown variable `y`"]
    );

    let f = jit.interner.find("f").unwrap();
    assert_eq!(jit.backend.lookup_arity(f), Some(1));

    assert_eq!(
        jit.eval("def f(a b) a;"),
        ["error: function `f` was declared with 1 parameter(s), found 2"]
    );
    assert_eq!(jit.eval("def f(a) a + 1; f(1)"), ["ok", "=> 2"]);
}

#[test]
fn redefinition_is_rejected() {
    assert_eq!(
        eval("def f(x) x; def f(x) x + 1; f(1)"),
        ["ok", "error: function `f` is already defined", "=> 1"]
    );
}

#[test]
fn extern_redeclaration_checks_arity_only() {
    assert_eq!(
        eval("extern foo(a); extern foo(a b); extern foo(z); def foo(b) b + 1; foo(3)"),
        [
            "ok",
            "error: function `foo` was declared with 1 parameter(s), found 2",
            "ok",
            "ok",
            "=> 4",
        ]
    );
}

#[test]
fn runtime_functions() {
    assert_eq!(
        eval("extern sqrt(x); extern pow(x y); sqrt(16); pow(2, 10)"),
        ["ok", "ok", "=> 4", "=> 1024"]
    );
}

#[test]
fn runtime_arity_is_checked() {
    assert_eq!(
        eval("extern sin(a b)"),
        ["error: runtime function `sin` takes 1 parameter(s), found 2"]
    );
}

#[test]
fn unresolved_extern_cannot_be_called() {
    assert_eq!(
        eval("extern printf(x); printf(1)"),
        [
            "ok",
            "error: function `printf` is declared but has no definition"
        ]
    );
}

#[test]
fn duplicate_parameters_are_rejected() {
    assert_eq!(
        eval("def foo(x x) x"),
        ["error: duplicate parameter `x`"]
    );
}

#[test]
fn anonymous_expressions_stay_out_of_namespace() {
    let mut jit = Jit::new();

    assert_eq!(jit.eval("1 + 1; 2 + 2"), ["=> 2", "=> 4"]);

    let anon = jit.interner.find(ANON_FN_NAME).unwrap();
    assert_eq!(jit.backend.lookup_arity(anon), None);

    assert_eq!(
        jit.eval("__anon_expr()"),
        ["error: unknown function `__anon_expr`"]
    );
}

#[test]
fn state_persists_across_sources() {
    let mut jit = Jit::new();

    assert_eq!(jit.eval("def sq(x) x * x;"), ["ok"]);
    assert_eq!(jit.eval("sq(sq(3))"), ["=> 81"]);
}

#[test]
fn externs_are_not_invocable() {
    let mut jit = Jit::new();
    let lexer = Lexer::new("extern sqrt(x)".chars(), &mut jit.interner);
    let mut parser = Parser::new(lexer, &mut jit.operators);

    let unit = parser.parse_unit().unwrap();
    let artifact = jit
        .backend
        .compile_function(unit.unit().unwrap(), parser.interner())
        .unwrap();

    assert!(matches!(
        jit.backend.invoke(&artifact),
        Err(BackendError::NotInvocable)
    ));
}
