use kaleido_diagnostic::termcolor::{ColorChoice, StandardStream};

use crate::sourcemap::SourceMap;

pub use kaleido_diagnostic::*;

pub mod prelude {
    pub use super::{Diagnostic, IntoDiagnostic};
    pub use crate::sourcemap::{SourceId, SourceSpan};
    pub use kaleido_diagnostic::span::Span;
    pub use kaleido_diagnostic::{Severity, Snippet, SnippetKind};
}

pub type Diagnostic = kaleido_diagnostic::Diagnostic<SourceMap>;

/// Conversion of an error into a diagnostic, given what it should point into.
pub trait IntoDiagnostic<Context: ?Sized> {
    fn into_diagnostic(self, cx: &Context) -> Diagnostic;
}

impl IntoDiagnostic<()> for Diagnostic {
    fn into_diagnostic(self, _cx: &()) -> Diagnostic {
        self
    }
}

pub trait DiagnosticEmitter {
    fn emit_diagnostic(&mut self, diagnostic: Diagnostic, sources: &SourceMap);
}

/// Keeps diagnostics instead of printing them.
impl DiagnosticEmitter for Vec<Diagnostic> {
    fn emit_diagnostic(&mut self, diagnostic: Diagnostic, _sources: &SourceMap) {
        self.push(diagnostic);
    }
}

/// Renders each diagnostic to stderr as soon as it is reported, so in the REPL
/// it appears before the next prompt.
#[derive(Debug)]
pub struct PrettyDiagnosticEmitter {
    stream: StandardStream,
    config: Config,
}

impl PrettyDiagnosticEmitter {
    pub fn new(color: ColorChoice) -> Self {
        Self {
            stream: StandardStream::stderr(color),
            config: Config::default(),
        }
    }
}

impl Default for PrettyDiagnosticEmitter {
    fn default() -> Self {
        Self::new(ColorChoice::Auto)
    }
}

impl DiagnosticEmitter for PrettyDiagnosticEmitter {
    fn emit_diagnostic(&mut self, diagnostic: Diagnostic, sources: &SourceMap) {
        diagnostic
            .write_to_stream(sources, &self.config, &mut self.stream)
            .expect("failed to emit diagnostic");
    }
}
