
use kaleido_backend::{Backend, BackendResult};
use kaleido_frontend::ast::{FunctionUnit, TopLevel};
use kaleido_frontend::display::AstDisplay;
use kaleido_frontend::{ErrorCategory, Lexer, OperatorTable, Parser};
use kaleido_interner::Interner;
use kaleido_session::diagnostics::prelude::*;
use kaleido_session::diagnostics::DiagnosticEmitter;
use kaleido_session::sourcemap::Source;
use kaleido_session::Session;

/// What happened to one top-level unit.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Defined { name: String, arity: usize },
    Declared { name: String, arity: usize },
    Evaluated(f64),
    Failed(Failure),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    SyntaxError,
    UnknownOperator,
    BackendRejection,
}

impl From<ErrorCategory> for Failure {
    fn from(category: ErrorCategory) -> Self {
        match category {
            ErrorCategory::SyntaxError => Failure::SyntaxError,
            ErrorCategory::UnknownOperator => Failure::UnknownOperator,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub units: usize,
    pub failures: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: &Outcome) {
        self.units += 1;

        if matches!(outcome, Outcome::Failed(_)) {
            self.failures += 1;
        }
    }
}

/// Runs sources one top-level unit at a time against a backend.
///
/// Declared operators, interned names and the backend's functions carry over
/// from one source to the next.
pub struct Driver<D: DiagnosticEmitter, B: Backend> {
    pub session: Session<D>,
    pub print_ast: bool,

    interner: Interner,
    operators: OperatorTable,
    backend: B,
}

impl<D: DiagnosticEmitter, B: Backend> Driver<D, B> {
    pub fn new(session: Session<D>, backend: B) -> Self {
        Self {
            session,
            print_ast: false,

            interner: Interner::new(),
            operators: OperatorTable::new(),
            backend,
        }
    }

    /// Parse and run every unit in `chars`, calling `on_outcome` after each.
    ///
    /// A unit that fails is reported and leaves the operator table as it was
    /// before the unit; the next unit is then tried.
    pub fn run_source(
        &mut self,
        name: &str,
        chars: impl Iterator<Item = char>,
        mut on_outcome: impl FnMut(&Outcome),
    ) -> RunSummary {
        let source_id = self.session.sources.insert(Source::new(name, ""));

        let lexer = Lexer::new(chars, &mut self.interner);
        let mut parser = Parser::new(lexer, &mut self.operators);

        let mut summary = RunSummary::default();

        loop {
            let checkpoint = parser.operators().clone();

            let outcome = match parser.parse_unit() {
                Ok(TopLevel::End) => break,

                Ok(top_level) => {
                    let Some(unit) = top_level.unit() else {
                        continue;
                    };

                    if self.print_ast {
                        println!("{}", top_level.display(parser.interner()));
                    }

                    match evaluate(&mut self.backend, unit, parser.interner()) {
                        Ok(outcome) => outcome,
                        Err(err) => {
                            parser.restore_operators(checkpoint);

                            self.session
                                .sources
                                .update_text(source_id, parser.lexer().text());
                            let _ = self
                                .session
                                .report(err, &SourceSpan::new(unit.span(), source_id));

                            Outcome::Failed(Failure::BackendRejection)
                        }
                    }
                }

                Err(err) => {
                    parser.restore_operators(checkpoint);

                    let failure = Failure::from(err.category());

                    self.session
                        .sources
                        .update_text(source_id, parser.lexer().text());
                    let _ = self.session.report(err, &source_id);

                    Outcome::Failed(failure)
                }
            };

            summary.record(&outcome);
            on_outcome(&outcome);
        }

        summary
    }

    /// Parse every unit in `chars` without running anything, printing each
    /// syntax tree.
    pub fn dump_ast(&mut self, name: &str, chars: impl Iterator<Item = char>) -> RunSummary {
        let source_id = self.session.sources.insert(Source::new(name, ""));

        let lexer = Lexer::new(chars, &mut self.interner);
        let mut parser = Parser::new(lexer, &mut self.operators);

        let mut summary = RunSummary::default();

        loop {
            let checkpoint = parser.operators().clone();

            match parser.parse_unit() {
                Ok(TopLevel::End) => break,
                Ok(TopLevel::Empty) => {}

                Ok(top_level) => {
                    println!("{}", top_level.display(parser.interner()));
                    summary.units += 1;
                }

                Err(err) => {
                    parser.restore_operators(checkpoint);

                    self.session
                        .sources
                        .update_text(source_id, parser.lexer().text());
                    let _ = self.session.report(err, &source_id);

                    summary.units += 1;
                    summary.failures += 1;
                }
            }
        }

        summary
    }
}

fn evaluate<B: Backend>(
    backend: &mut B,
    unit: &FunctionUnit,
    interner: &Interner,
) -> BackendResult<Outcome> {
    let artifact = backend.compile_function(unit, interner)?;

    if unit.proto.is_anonymous() {
        return backend.invoke(&artifact).map(Outcome::Evaluated);
    }

    let name = interner.resolve(unit.proto.name).to_owned();
    let arity = unit.proto.arity();

    if unit.is_extern() {
        Ok(Outcome::Declared { name, arity })
    } else {
        Ok(Outcome::Defined { name, arity })
    }
}
