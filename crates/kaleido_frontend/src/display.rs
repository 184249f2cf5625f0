//! S-expression rendering of the AST, e.g. `(+ a (* b c))`.

use std::fmt::{self, Display};

use kaleido_interner::Interner;

use crate::ast::*;

pub trait AstDisplay {
    fn fmt_with(&self, f: &mut fmt::Formatter, interner: &Interner) -> fmt::Result;

    /// # Panics
    /// Formatting panics if the node holds symbols from another interner.
    fn display<'a>(&'a self, interner: &'a Interner) -> DisplayNode<'a, Self> {
        DisplayNode {
            node: self,
            interner,
        }
    }
}

pub struct DisplayNode<'a, T: ?Sized> {
    node: &'a T,
    interner: &'a Interner,
}

impl<T: AstDisplay + ?Sized> Display for DisplayNode<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.node.fmt_with(f, self.interner)
    }
}

impl AstDisplay for TopLevel {
    fn fmt_with(&self, f: &mut fmt::Formatter, interner: &Interner) -> fmt::Result {
        match self {
            TopLevel::End => write!(f, "<end>"),
            TopLevel::Empty => write!(f, "<empty>"),
            TopLevel::Definition(unit) | TopLevel::Extern(unit) | TopLevel::Expression(unit) => {
                unit.fmt_with(f, interner)
            }
        }
    }
}

impl AstDisplay for FunctionUnit {
    fn fmt_with(&self, f: &mut fmt::Formatter, interner: &Interner) -> fmt::Result {
        match &self.body {
            Some(body) if self.proto.is_anonymous() => {
                write!(f, "(expr {})", body.display(interner))
            }
            Some(body) => write!(
                f,
                "(def {} {})",
                self.proto.display(interner),
                body.display(interner)
            ),
            None => write!(f, "(extern {})", self.proto.display(interner)),
        }
    }
}

impl AstDisplay for Prototype {
    fn fmt_with(&self, f: &mut fmt::Formatter, interner: &Interner) -> fmt::Result {
        write!(f, "{}(", interner.resolve(self.name))?;

        for (i, &param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", interner.resolve(param))?;
        }

        write!(f, ")")?;

        if let ProtoKind::Binary { info, .. } = self.kind {
            write!(f, " [{} {}]", info.precedence, info.assoc.as_str())?;
        }

        Ok(())
    }
}

impl AstDisplay for Expr {
    fn fmt_with(&self, f: &mut fmt::Formatter, interner: &Interner) -> fmt::Result {
        match &self.kind {
            ExprKind::Number(n) => write!(f, "{n}"),
            ExprKind::Variable(name) => write!(f, "{}", interner.resolve(*name)),

            ExprKind::Unary { op, operand } => {
                write!(f, "({op} {})", operand.display(interner))
            }

            ExprKind::Binary { op, lhs, rhs } => write!(
                f,
                "({op} {} {})",
                lhs.display(interner),
                rhs.display(interner)
            ),

            ExprKind::Call { callee, args } => {
                write!(f, "(call {}", interner.resolve(*callee))?;
                for arg in args {
                    write!(f, " {}", arg.display(interner))?;
                }
                write!(f, ")")
            }

            ExprKind::If { cond, then, else_ } => {
                write!(
                    f,
                    "(if {} {}",
                    cond.display(interner),
                    then.display(interner)
                )?;
                if let Some(else_) = else_ {
                    write!(f, " {}", else_.display(interner))?;
                }
                write!(f, ")")
            }

            ExprKind::For {
                var,
                start,
                end,
                step,
                body,
            } => write!(
                f,
                "(for {} {} {} {} {})",
                interner.resolve(*var),
                start.display(interner),
                end.display(interner),
                step.display(interner),
                body.display(interner)
            ),
        }
    }
}
