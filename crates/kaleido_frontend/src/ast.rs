use kaleido_diagnostic::span::Span;
use kaleido_interner::Symbol;

use crate::operators::OperatorInfo;
use crate::{Node, NodeCopy};

/// Name given to the prototype wrapping a top-level expression.
pub const ANON_FN_NAME: &str = "__anon_expr";

#[derive(Node!)]
pub enum TopLevel {
    End,
    Empty,
    Definition(FunctionUnit),
    Extern(FunctionUnit),
    Expression(FunctionUnit),
}

impl TopLevel {
    pub fn unit(&self) -> Option<&FunctionUnit> {
        match self {
            TopLevel::Definition(unit) | TopLevel::Extern(unit) | TopLevel::Expression(unit) => {
                Some(unit)
            }
            TopLevel::End | TopLevel::Empty => None,
        }
    }
}

/// A function definition, an extern declaration (no body) or a wrapped
/// top-level expression.
#[derive(Node!)]
pub struct FunctionUnit {
    pub proto: Prototype,
    pub body: Option<Expr>,
}

impl FunctionUnit {
    pub fn is_extern(&self) -> bool {
        self.body.is_none()
    }

    pub fn span(&self) -> Span {
        match &self.body {
            Some(body) => self.proto.span.union(body.span),
            None => self.proto.span,
        }
    }
}

#[derive(Node!)]
pub struct Prototype {
    pub name: Symbol,
    pub params: Vec<Symbol>,
    pub kind: ProtoKind,
    pub span: Span,
}

impl Prototype {
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn is_anonymous(&self) -> bool {
        self.kind == ProtoKind::Anonymous
    }
}

#[derive(NodeCopy!)]
pub enum ProtoKind {
    Function,
    Anonymous,
    Unary(char),
    Binary { op: char, info: OperatorInfo },
}

/// Name of the function implementing a user-defined operator, e.g. `binary|`.
pub fn operator_fn_name(fixity: OperatorFixity, op: char) -> String {
    format!("{}{op}", fixity.as_str())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorFixity {
    Unary,
    Binary,
}

impl OperatorFixity {
    pub fn as_str(self) -> &'static str {
        match self {
            OperatorFixity::Unary => "unary",
            OperatorFixity::Binary => "binary",
        }
    }

    pub fn arity(self) -> usize {
        match self {
            OperatorFixity::Unary => 1,
            OperatorFixity::Binary => 2,
        }
    }
}

#[derive(Node!)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Node!)]
pub enum ExprKind {
    Number(f64),
    Variable(Symbol),

    Unary {
        op: char,
        operand: Box<Expr>,
    },

    Binary {
        op: char,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },

    Call {
        callee: Symbol,
        args: Vec<Expr>,
    },

    If {
        cond: Box<Expr>,
        then: Box<Expr>,
        else_: Option<Box<Expr>>,
    },

    For {
        var: Symbol,
        start: Box<Expr>,
        end: Box<Expr>,
        step: Box<Expr>,
        body: Box<Expr>,
    },
}
