use kaleido_diagnostic::span::Span;

use super::{ParseError, ParseErrorKind, ParseResult, Parser};
use crate::ast::*;
use crate::operators::*;
use crate::token::*;

/// Whether `rhs` should be absorbed into the right operand of `current`
/// rather than taking the result of `current` as its left operand.
fn binds_rhs(current: OperatorInfo, next_precedence: i32) -> bool {
    let precedence = i32::from(current.precedence);
    next_precedence > precedence || current.assoc == Assoc::Right && next_precedence == precedence
}

impl<I: Iterator<Item = char>> Parser<'_, I> {
    pub fn parse_expr(&mut self) -> ParseResult<Expr> {
        let lhs = self.parse_unary()?;
        self.parse_bin_op_rhs(0, lhs)
    }

    fn parse_bin_op_rhs(&mut self, min_precedence: i32, mut lhs: Expr) -> ParseResult<Expr> {
        loop {
            let Some((op, info)) = self.peek_bin_op()? else {
                return Ok(lhs);
            };

            if i32::from(info.precedence) < min_precedence {
                return Ok(lhs);
            }

            self.advance();

            let mut rhs = self.parse_unary()?;

            // keep absorbing while the following operator binds tighter, so
            // `a < b * c + d` takes `b * c + d` as its right operand
            loop {
                let next_precedence = self.peek_precedence()?;
                if !binds_rhs(info, next_precedence) {
                    break;
                }

                rhs = self.parse_bin_op_rhs(next_precedence, rhs)?;
            }

            let span = lhs.span.union(rhs.span);
            lhs = Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }
    }

    /// The binary operator at the current token, if there is one.
    ///
    /// An operator symbol missing from the table is an error rather than the
    /// end of the expression.
    fn peek_bin_op(&self) -> ParseResult<Option<(char, OperatorInfo)>> {
        let token = self.current();

        match token.kind {
            TokenKind::Op(op) => match self.operators.get(op) {
                Some(info) => Ok(Some((op, info))),
                None => Err(ParseError::new(
                    ParseErrorKind::UnknownOperator(op),
                    token.span,
                )),
            },
            _ => Ok(None),
        }
    }

    fn peek_precedence(&self) -> ParseResult<i32> {
        let token = self.current();
        self.peek_bin_op()?;
        Ok(self.operators.precedence(&token))
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        let token = self.current();

        match token.kind {
            TokenKind::Op(op) if is_unary_operator(op) => {
                self.advance();

                let operand = self.parse_unary()?;
                let span = token.span.union(operand.span);

                Ok(Expr::new(
                    ExprKind::Unary {
                        op,
                        operand: Box::new(operand),
                    },
                    span,
                ))
            }

            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let token = self.current();

        match token.kind {
            TokenKind::Number(n) => {
                self.advance();
                Ok(Expr::new(ExprKind::Number(n), token.span))
            }

            TokenKind::Identifier(name) => {
                self.advance();

                if self.eat_kind(TokenKind::LParen) {
                    let args = self.parse_call_args()?;
                    let span = token.span.union(self.prev_span);

                    Ok(Expr::new(ExprKind::Call { callee: name, args }, span))
                } else {
                    Ok(Expr::new(ExprKind::Variable(name), token.span))
                }
            }

            TokenKind::LParen => {
                self.advance();

                let expr = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;

                Ok(expr)
            }

            TokenKind::Keyword(Keyword::If) => self.parse_if(),
            TokenKind::Keyword(Keyword::For) => self.parse_for(),

            _ => Err(self.error_expected("an expression", token)),
        }
    }

    /// Arguments after the opening `(`, up to and including the closing `)`.
    fn parse_call_args(&mut self) -> ParseResult<Vec<Expr>> {
        let mut args = vec![];

        if self.eat_kind(TokenKind::RParen) {
            return Ok(args);
        }

        loop {
            args.push(self.parse_expr()?);

            if self.eat_kind(TokenKind::RParen) {
                return Ok(args);
            }

            if !self.eat_kind(TokenKind::Comma) {
                return Err(self.error_expected("`)` or `,` in argument list", self.current()));
            }
        }
    }

    fn parse_if(&mut self) -> ParseResult<Expr> {
        let start = self.advance().span;

        let cond = self.parse_expr()?;
        self.expect(TokenKind::Keyword(Keyword::Then))?;
        let then = self.parse_expr()?;

        let else_ = if self.eat_kind(TokenKind::Keyword(Keyword::Else)) {
            Some(Box::new(self.parse_expr()?))
        } else {
            None
        };

        Ok(Expr::new(
            ExprKind::If {
                cond: Box::new(cond),
                then: Box::new(then),
                else_,
            },
            start.union(self.prev_span),
        ))
    }

    fn parse_for(&mut self) -> ParseResult<Expr> {
        let start_span = self.advance().span;

        let (var, _) = self.parse_ident()?;
        self.expect(TokenKind::Assign)?;

        let start = self.parse_expr()?;
        self.expect(TokenKind::Comma)?;
        let end = self.parse_expr()?;

        let step = if self.eat_kind(TokenKind::Comma) {
            self.parse_expr()?
        } else {
            // implicit step of one, positioned where it would have been written
            Expr::new(ExprKind::Number(1.0), Span::empty(self.current().span.start))
        };

        self.expect(TokenKind::Keyword(Keyword::In))?;
        let body = self.parse_expr()?;

        Ok(Expr::new(
            ExprKind::For {
                var,
                start: Box::new(start),
                end: Box::new(end),
                step: Box::new(step),
                body: Box::new(body),
            },
            start_span.union(self.prev_span),
        ))
    }
}
