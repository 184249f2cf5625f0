pub mod diagnostics;
pub mod sourcemap;

use diagnostics::*;
use sourcemap::SourceMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorsEmitted;

/// State shared by every source run through one interpreter session.
pub struct Session<D: DiagnosticEmitter> {
    pub sources: SourceMap,
    pub diagnostics: D,

    errors: usize,
}

impl<D: DiagnosticEmitter> Session<D> {
    pub fn new(diagnostics: D) -> Self {
        Self {
            sources: SourceMap::default(),
            diagnostics,
            errors: 0,
        }
    }

    pub fn report<Context: ?Sized>(
        &mut self,
        diagnostic: impl IntoDiagnostic<Context>,
        cx: &Context,
    ) -> Result<(), ErrorsEmitted> {
        let diagnostic = diagnostic.into_diagnostic(cx);
        let severity = diagnostic.severity;

        self.diagnostics.emit_diagnostic(diagnostic, &self.sources);

        if severity < Severity::Error {
            Ok(())
        } else {
            self.errors += 1;
            Err(ErrorsEmitted)
        }
    }

    /// Number of error diagnostics reported so far.
    pub fn error_count(&self) -> usize {
        self.errors
    }

    pub fn had_errors(&self) -> bool {
        self.errors > 0
    }
}
