use kaleido_frontend::ast::FunctionUnit;
use kaleido_interner::{Interner, Symbol};
use kaleido_session::diagnostics::prelude::*;
use target_lexicon::Architecture;

pub mod jit;
pub mod runtime;

pub use jit::{JitArtifact, JitBackend};

/// Code generation for one top-level unit at a time.
///
/// The backend is the record of which functions exist: definitions and extern
/// declarations accumulate across calls to [`Backend::compile_function`].
pub trait Backend {
    type Artifact;

    /// Compile a definition, record an extern declaration, or compile a
    /// top-level expression into something [`Backend::invoke`] can run.
    fn compile_function(
        &mut self,
        unit: &FunctionUnit,
        interner: &Interner,
    ) -> BackendResult<Self::Artifact>;

    /// Parameter count of a declared or defined function.
    fn lookup_arity(&self, name: Symbol) -> Option<usize>;

    /// Run a zero-parameter artifact.
    fn invoke(&mut self, artifact: &Self::Artifact) -> BackendResult<f64>;
}

#[derive(thiserror::Error, Debug)]
pub enum BackendError {
    #[error("function `{0}` is already defined")]
    Redefinition(String),

    #[error("function `{name}` was declared with {declared} parameter(s), found {found}")]
    ArityMismatch {
        name: String,
        declared: usize,
        found: usize,
    },

    #[error("duplicate parameter `{name}`")]
    DuplicateParam { name: String, span: Span },

    #[error("unknown variable `{name}`")]
    UnknownVariable { name: String, span: Span },

    #[error("unknown function `{name}`")]
    UnknownFunction { name: String, span: Span },

    #[error("function `{name}` is declared but has no definition")]
    Undefined { name: String, span: Span },

    #[error("function `{name}` takes {expected} argument(s), found {found}")]
    CallArity {
        name: String,
        expected: usize,
        found: usize,
        span: Span,
    },

    #[error("unknown unary operator `{op}`")]
    UnknownUnaryOperator { op: char, span: Span },

    #[error("unknown binary operator `{op}`")]
    UnknownBinaryOperator { op: char, span: Span },

    #[error("runtime function `{name}` takes {expected} parameter(s), found {found}")]
    RuntimeArity {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("only compiled functions without parameters can be invoked")]
    NotInvocable,

    #[error("unsupported architecture: {0}")]
    UnsupportedArch(Architecture),

    #[error("invalid codegen setting: {0}")]
    Settings(String),

    #[error(transparent)]
    Module(#[from] cranelift_module::ModuleError),

    #[error(transparent)]
    Codegen(#[from] cranelift::codegen::CodegenError),
}

impl BackendError {
    /// The expression this error points at, if narrower than the whole unit.
    pub fn span(&self) -> Option<Span> {
        match self {
            BackendError::DuplicateParam { span, .. }
            | BackendError::UnknownVariable { span, .. }
            | BackendError::UnknownFunction { span, .. }
            | BackendError::Undefined { span, .. }
            | BackendError::CallArity { span, .. }
            | BackendError::UnknownUnaryOperator { span, .. }
            | BackendError::UnknownBinaryOperator { span, .. } => Some(*span),
            _ => None,
        }
    }
}

/// Reported against the span of the unit that was rejected.
impl IntoDiagnostic<SourceSpan> for BackendError {
    fn into_diagnostic(self, unit: &SourceSpan) -> Diagnostic {
        let message = match self {
            BackendError::UnknownUnaryOperator { .. }
            | BackendError::UnknownBinaryOperator { .. } => "unknown operator",
            _ => "rejected by backend",
        };

        let span = self.span().unwrap_or(unit.span);

        Diagnostic::error()
            .with_message(message)
            .with_snippet(Snippet::primary(self.to_string(), unit.source_id, span))
    }
}

pub type BackendResult<T> = Result<T, BackendError>;
