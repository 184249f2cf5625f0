mod cli;
mod driver;
mod input;

use clap::Parser as _;
use kaleido_backend::{BackendError, JitBackend};
use kaleido_frontend::token::TokenKind;
use kaleido_frontend::Lexer;
use kaleido_interner::Interner;
use kaleido_session::diagnostics::termcolor::ColorChoice;
use kaleido_session::diagnostics::PrettyDiagnosticEmitter;
use kaleido_session::Session;

use crate::cli::{Cli, ColorMode, Command};
use crate::driver::{Driver, Outcome};
use crate::input::LineChars;

#[derive(thiserror::Error, Debug)]
enum KaleidoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to start the JIT: {0}")]
    Backend(#[from] BackendError),

    #[error("{0} unit(s) failed")]
    HadErrors(usize),
}

type KaleidoResult<T> = Result<T, KaleidoError>;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> KaleidoResult<()> {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorMode::Auto => ColorChoice::Auto,
        ColorMode::Always => ColorChoice::Always,
        ColorMode::Never => ColorChoice::Never,
    };

    match cli.command {
        Command::Run {
            inputs,
            source,
            print_ast,
            verbose,
        } => {
            let mut driver = new_driver(print_ast, color)?;
            let mut failures = 0;

            for input in inputs {
                let (name, text) = load(input, source)?;

                if verbose {
                    println!("running {name}...");
                }

                let summary = driver.run_source(&name, text.chars(), |outcome| {
                    print_outcome(outcome, verbose);
                });
                failures += summary.failures;
            }

            if failures > 0 {
                return Err(KaleidoError::HadErrors(failures));
            }

            Ok(())
        }

        Command::Repl { print_ast, verbose } => {
            let mut driver = new_driver(print_ast, color)?;

            let mut input = LineChars::new(std::io::stdin().lock(), "ready> ");
            driver.run_source("<stdin>", &mut input, |outcome| {
                print_outcome(outcome, verbose);
            });

            match input.take_error() {
                Some(err) => Err(err.into()),
                None => Ok(()),
            }
        }

        Command::Tokens { input, source } => {
            let (_, text) = load(input, source)?;

            let mut interner = Interner::new();
            let mut lexer = Lexer::new(text.chars(), &mut interner);

            loop {
                let token = lexer.advance();
                if token.kind == TokenKind::Eof {
                    break;
                }

                let kind = match token.kind {
                    TokenKind::Identifier(_) => "Identifier".to_owned(),
                    kind => format!("{kind:?}"),
                };

                println!(
                    "{:>4}..{:<4} {kind:<20} {:?}",
                    token.span.start,
                    token.span.end,
                    lexer.lexeme(token.span)
                );
            }

            Ok(())
        }

        Command::Parse { input, source } => {
            let (name, text) = load(input, source)?;

            let mut driver = new_driver(false, color)?;
            let summary = driver.dump_ast(&name, text.chars());

            if summary.failures > 0 {
                return Err(KaleidoError::HadErrors(summary.failures));
            }

            Ok(())
        }
    }
}

fn new_driver(
    print_ast: bool,
    color: ColorChoice,
) -> KaleidoResult<Driver<PrettyDiagnosticEmitter, JitBackend>> {
    let session = Session::new(PrettyDiagnosticEmitter::new(color));
    let mut driver = Driver::new(session, JitBackend::new()?);
    driver.print_ast = print_ast;

    Ok(driver)
}

fn load(input: String, source: bool) -> KaleidoResult<(String, String)> {
    if source {
        Ok(("<unnamed>".to_owned(), input))
    } else {
        let text = std::fs::read_to_string(&input)?;
        Ok((input, text))
    }
}

fn print_outcome(outcome: &Outcome, verbose: bool) {
    match outcome {
        Outcome::Evaluated(value) => println!("=> {value}"),
        Outcome::Defined { name, arity } if verbose => println!("defined {name}/{arity}"),
        Outcome::Declared { name, arity } if verbose => println!("declared {name}/{arity}"),
        _ => {}
    }
}
